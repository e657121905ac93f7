//! Uniform blocks of the level shaders and the per-frame values shared by
//! every level shape.

use std::f32::consts::TAU;

use cgmath::{Matrix4, Vector4};

use crate::level::layout::LIGHT_DIRECTION;

/// Scale/bias that leaves texture coordinates untouched.
pub const IDENTITY_SCALE_BIAS: [f32; 4] = [1.0, 1.0, 0.0, 0.0];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LevelSceneParams {
    pub projection: [[f32; 4]; 4],
}

impl LevelSceneParams {
    pub fn new(projection: &Matrix4<f32>) -> Self {
        Self {
            projection: (*projection).into(),
        }
    }
}

/// Per-shape block, matching `ShapeParams` in `level.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShapeParams {
    pub model_view: [[f32; 4]; 3],
    pub light_direction: [f32; 4],
    pub tex_scale_bias_pre: [f32; 4],
    pub tex_scale_bias_post: [f32; 4],
    pub shadow_tex_scale_bias: [f32; 4],
    /// x: base diffuse, y: base ambient
    pub misc: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyParams {
    pub tex_scale_bias: [f32; 4],
}

/// The top three rows of `m`, for shaders that take a 4x3 matrix.
pub fn matrix4x3_rows(m: &Matrix4<f32>) -> [[f32; 4]; 3] {
    [
        [m.x.x, m.y.x, m.z.x, m.w.x],
        [m.x.y, m.y.y, m.z.y, m.w.y],
        [m.x.z, m.y.z, m.z.z, m.w.z],
    ]
}

/// Horizontal scroll of the cloud shadow texture for a camera with this view
/// matrix; one unit per quarter turn of the camera around Y.
pub fn shadow_rotation_offset(view: &Matrix4<f32>) -> f32 {
    -(f32::atan2(-view.x.z, view.x.x) / TAU) * 4.0
}

/// Level-wide shading inputs, recomputed every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelRenderData {
    /// View-space light direction. Not renormalized.
    pub light_direction: Vector4<f32>,
    pub shadow_tex_scale_bias: [f32; 4],
    pub base_diffuse: f32,
    pub base_ambient: f32,
}

impl LevelRenderData {
    pub fn for_frame(view: &Matrix4<f32>, base_diffuse: f32, base_ambient: f32) -> Self {
        Self {
            light_direction: *view * Vector4::from(LIGHT_DIRECTION),
            shadow_tex_scale_bias: [0.5, 0.5, shadow_rotation_offset(view), 0.0],
            base_diffuse,
            base_ambient,
        }
    }

    pub fn shape_params(
        &self,
        model_view: &Matrix4<f32>,
        tex_scale_bias_pre: [f32; 4],
        tex_scale_bias_post: [f32; 4],
    ) -> ShapeParams {
        ShapeParams {
            model_view: matrix4x3_rows(model_view),
            light_direction: self.light_direction.into(),
            tex_scale_bias_pre,
            tex_scale_bias_post,
            shadow_tex_scale_bias: self.shadow_tex_scale_bias,
            misc: [self.base_diffuse, self.base_ambient, 0.0, 0.0],
        }
    }
}
