use crate::{
    data_structures::{
        geometry::{LevelVertex, Vertex},
        texture,
    },
    pipelines::basic::{MegaState, mk_pipeline_layout, mk_render_pipeline, mk_texture_layout},
};

/// Triles and art objects: clockwise front faces, back faces culled.
pub fn object_mega_state() -> MegaState {
    MegaState {
        front_face: wgpu::FrontFace::Cw,
        cull_mode: Some(wgpu::Face::Back),
        ..Default::default()
    }
}

/// Background planes blend alpha-over; double-sided ones are never culled.
pub fn plane_mega_state(double_sided: bool) -> MegaState {
    MegaState {
        cull_mode: if double_sided { None } else { Some(wgpu::Face::Back) },
        blend: Some(MegaState::ALPHA_OVER),
        ..object_mega_state()
    }
}

/// Drawn first and behind everything: no depth test, no depth write.
pub fn sky_mega_state() -> MegaState {
    MegaState {
        cull_mode: None,
        depth_write: false,
        depth_compare: wgpu::CompareFunction::Always,
        ..Default::default()
    }
}

/// Every pipeline the level scene draws with, built once per scene.
///
/// Group 0 is the uniform arena, group 1 the textures: diffuse + shadow for
/// level shapes, the sky background alone for the sky.
#[derive(Debug)]
pub struct LevelPipelines {
    pub shape_texture_layout: wgpu::BindGroupLayout,
    pub sky_texture_layout: wgpu::BindGroupLayout,
    /// Triles and art objects.
    pub object: wgpu::RenderPipeline,
    /// Single-sided background planes.
    pub plane_culled: wgpu::RenderPipeline,
    pub plane_double_sided: wgpu::RenderPipeline,
    pub sky: wgpu::RenderPipeline,
}

impl LevelPipelines {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        uniform_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let shape_texture_layout = mk_texture_layout(device, "level_shape_texture_layout", 2);
        let sky_texture_layout = mk_texture_layout(device, "level_sky_texture_layout", 1);
        let shape_layout = mk_pipeline_layout(
            device,
            "Level Shape Pipeline Layout",
            &[uniform_layout, &shape_texture_layout],
        );
        let sky_layout = mk_pipeline_layout(
            device,
            "Level Sky Pipeline Layout",
            &[uniform_layout, &sky_texture_layout],
        );

        let shape_shader = || wgpu::ShaderModuleDescriptor {
            label: Some("Level Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("level.wgsl").into()),
        };

        let object = mk_render_pipeline(
            device,
            "Level Object Pipeline",
            &shape_layout,
            color_format,
            object_mega_state(),
            Some(texture::Texture::DEPTH_FORMAT),
            &[LevelVertex::desc()],
            shape_shader(),
        );
        let plane_culled = mk_render_pipeline(
            device,
            "Background Plane Pipeline",
            &shape_layout,
            color_format,
            plane_mega_state(false),
            Some(texture::Texture::DEPTH_FORMAT),
            &[LevelVertex::desc()],
            shape_shader(),
        );
        let plane_double_sided = mk_render_pipeline(
            device,
            "Double Sided Background Plane Pipeline",
            &shape_layout,
            color_format,
            plane_mega_state(true),
            Some(texture::Texture::DEPTH_FORMAT),
            &[LevelVertex::desc()],
            shape_shader(),
        );
        let sky = mk_render_pipeline(
            device,
            "Sky Pipeline",
            &sky_layout,
            color_format,
            sky_mega_state(),
            Some(texture::Texture::DEPTH_FORMAT),
            &[],
            wgpu::ShaderModuleDescriptor {
                label: Some("Sky Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("sky.wgsl").into()),
            },
        );

        Self {
            shape_texture_layout,
            sky_texture_layout,
            object,
            plane_culled,
            plane_double_sided,
            sky,
        }
    }

    pub fn plane(&self, double_sided: bool) -> &wgpu::RenderPipeline {
        if double_sided {
            &self.plane_double_sided
        } else {
            &self.plane_culled
        }
    }
}
