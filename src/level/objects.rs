//! Per-instance level renderers.
//!
//! Each renderer owns what it binds (bind groups, its sampler, a handle on
//! shared geometry) and knows how to turn itself into one [`RenderInst`] per
//! frame. Model matrices are fixed at construction.

use std::sync::Arc;

use cgmath::{Matrix4, Vector2};

use crate::{
    data_structures::geometry::GeometryData,
    flow::ViewerInput,
    level::{
        animation::{PlaneAnimation, calc_tex_scale_bias},
        uniforms::{IDENTITY_SCALE_BIAS, LevelRenderData, SkyParams},
    },
    pipelines::level::LevelPipelines,
    render::{DrawCall, RenderInst, RenderInstManager, RenderLayer},
};

/// Sample the middle column of the sky gradient, top to bottom.
const SKY_TEX_SCALE_BIAS: [f32; 4] = [0.0, 1.0, 0.5, 0.0];

/// A trile or an art object: textured, indexed, frustum culled.
#[derive(Debug)]
pub struct FezObjectRenderer {
    geometry: Arc<GeometryData>,
    bind_group: wgpu::BindGroup,
    model_matrix: Matrix4<f32>,
}

impl FezObjectRenderer {
    /// `bind_group` holds the object's diffuse texture and the level shadow map.
    pub fn new(geometry: Arc<GeometryData>, bind_group: wgpu::BindGroup, model_matrix: Matrix4<f32>) -> Self {
        Self {
            geometry,
            bind_group,
            model_matrix,
        }
    }

    pub fn model_matrix(&self) -> &Matrix4<f32> {
        &self.model_matrix
    }

    pub fn is_visible(&self, input: &ViewerInput) -> bool {
        input
            .frustum
            .contains(&self.geometry.bbox.transform(&self.model_matrix))
    }

    pub fn prepare_to_render<'a>(
        &'a self,
        pipelines: &'a LevelPipelines,
        level: &LevelRenderData,
        scene_offset: u32,
        input: &ViewerInput,
        manager: &mut RenderInstManager<'a>,
    ) {
        if !self.is_visible(input) {
            return;
        }

        let model_view = input.view * self.model_matrix;
        let shape = level.shape_params(&model_view, IDENTITY_SCALE_BIAS, IDENTITY_SCALE_BIAS);
        let shape_offset = manager.allocate_uniform(&shape);
        manager.push(RenderInst {
            layer: RenderLayer::Opaque,
            pipeline: &pipelines.object,
            uniform_offsets: [scene_offset, shape_offset],
            bind_groups: vec![&self.bind_group],
            vertex_buffers: vec![&self.geometry.vertex_buffer],
            index_buffer: Some(&self.geometry.index_buffer),
            draw: DrawCall::Indexed(self.geometry.index_count),
            visible: true,
        });
    }
}

/// A textured, optionally animated quad. Never culled.
#[derive(Debug)]
pub struct BackgroundPlaneRenderer {
    pub name: String,
    quad: Arc<GeometryData>,
    // kept alive alongside the bind group that references it
    _sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
    model_matrix: Matrix4<f32>,
    raw_scale: Vector2<f32>,
    double_sided: bool,
    animation: Option<PlaneAnimation>,
    phase: f32,
}

impl BackgroundPlaneRenderer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        quad: Arc<GeometryData>,
        sampler: wgpu::Sampler,
        bind_group: wgpu::BindGroup,
        model_matrix: Matrix4<f32>,
        raw_scale: Vector2<f32>,
        double_sided: bool,
        animation: Option<PlaneAnimation>,
        phase: f32,
    ) -> Self {
        Self {
            name,
            quad,
            _sampler: sampler,
            bind_group,
            model_matrix,
            raw_scale,
            double_sided,
            animation,
            phase,
        }
    }

    pub fn model_matrix(&self) -> &Matrix4<f32> {
        &self.model_matrix
    }

    /// Texture rectangle shown at `time` seconds of viewer time.
    pub fn tex_scale_bias(&self, time: f32) -> [f32; 4] {
        calc_tex_scale_bias(self.animation.as_ref(), time + self.phase)
    }

    pub fn prepare_to_render<'a>(
        &'a self,
        pipelines: &'a LevelPipelines,
        level: &LevelRenderData,
        scene_offset: u32,
        input: &ViewerInput,
        manager: &mut RenderInstManager<'a>,
    ) {
        let model_view = input.view * self.model_matrix;
        let pre = [self.raw_scale.x, self.raw_scale.y, 0.0, 0.0];
        let shape = level.shape_params(&model_view, pre, self.tex_scale_bias(input.time));
        let shape_offset = manager.allocate_uniform(&shape);
        manager.push(RenderInst {
            layer: RenderLayer::Translucent,
            pipeline: pipelines.plane(self.double_sided),
            uniform_offsets: [scene_offset, shape_offset],
            bind_groups: vec![&self.bind_group],
            vertex_buffers: vec![&self.quad.vertex_buffer],
            index_buffer: Some(&self.quad.index_buffer),
            draw: DrawCall::Indexed(self.quad.index_count),
            visible: true,
        });
    }
}

/// Fullscreen sky backdrop.
#[derive(Debug)]
pub struct SkyRenderer {
    pub name: String,
    _sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
}

impl SkyRenderer {
    pub fn new(name: String, sampler: wgpu::Sampler, bind_group: wgpu::BindGroup) -> Self {
        Self {
            name,
            _sampler: sampler,
            bind_group,
        }
    }

    pub fn prepare_to_render<'a>(
        &'a self,
        pipelines: &'a LevelPipelines,
        scene_offset: u32,
        manager: &mut RenderInstManager<'a>,
    ) {
        let sky_offset = manager.allocate_uniform(&SkyParams {
            tex_scale_bias: SKY_TEX_SCALE_BIAS,
        });
        manager.push(RenderInst {
            layer: RenderLayer::Background,
            pipeline: &pipelines.sky,
            uniform_offsets: [scene_offset, sky_offset],
            bind_groups: vec![&self.bind_group],
            vertex_buffers: Vec::new(),
            index_buffer: None,
            draw: DrawCall::Vertices(3),
            visible: true,
        });
    }
}
