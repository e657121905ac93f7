use std::{collections::HashMap, sync::Arc};

use crate::{
    data_structures::{
        geometry::GeometryData,
        texture::{self, Texture},
    },
    error::Result,
    flow::{SceneGfx, ViewerInput},
    level::{
        cache::{ModelCache, SurfaceSource},
        layout::LevelLayout,
        objects::{BackgroundPlaneRenderer, FezObjectRenderer, SkyRenderer},
        uniforms::{LevelRenderData, LevelSceneParams},
        xml::LevelDocument,
    },
    pipelines::{basic::mk_texture_bind_group, level::LevelPipelines},
    render::RenderInstManager,
};

/// A loaded level, ready to draw.
///
/// Everything is resolved and uploaded in [`FezRenderer::new`]; per frame
/// only the camera-dependent uniforms are rebuilt.
#[derive(Debug)]
pub struct FezRenderer {
    pipelines: LevelPipelines,
    sky: SkyRenderer,
    triles: Vec<FezObjectRenderer>,
    art_objects: Vec<FezObjectRenderer>,
    background_planes: Vec<BackgroundPlaneRenderer>,
    base_diffuse: f32,
    base_ambient: f32,
    // bind groups reference these
    _shadow_sampler: wgpu::Sampler,
    _shadow_texture: Texture,
}

impl FezRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        uniform_layout: &wgpu::BindGroupLayout,
        cache: &ModelCache,
        document: &LevelDocument,
    ) -> Result<Self> {
        let layout = LevelLayout::build(document, cache)?;
        let pipelines = LevelPipelines::new(device, color_format, uniform_layout);

        // a black shadow map casts no shadow
        let shadow_texture = match layout.sky.shadows.first() {
            Some(shadow) => shadow.clone(),
            None => {
                log::warn!("Sky {} has no shadow texture", layout.sky.name);
                Texture::solid([0, 0, 0, 255], 1, 1, device, queue, "no_shadow_texture")
            }
        };
        let shadow_sampler = texture::create_default_sampler(device);

        let shape_bind_group = |label: &str, diffuse: &Texture, sampler: &wgpu::Sampler| {
            mk_texture_bind_group(
                device,
                label,
                &pipelines.shape_texture_layout,
                &[
                    (&diffuse.view, sampler),
                    (&shadow_texture.view, &shadow_sampler),
                ],
            )
        };

        let trileset = layout.trileset;
        let trileset_bind_group = shape_bind_group(
            &format!("trileset_{}_bind_group", trileset.name),
            trileset.texture(),
            trileset.sampler(),
        );
        let triles = layout
            .triles
            .iter()
            .map(|trile| {
                FezObjectRenderer::new(
                    Arc::clone(trile.geometry),
                    trileset_bind_group.clone(),
                    trile.model_matrix,
                )
            })
            .collect();

        let mut art_object_bind_groups: HashMap<&str, wgpu::BindGroup> = HashMap::new();
        let art_objects = layout
            .art_objects
            .iter()
            .map(|instance| {
                let bind_group = art_object_bind_groups
                    .entry(instance.name.as_str())
                    .or_insert_with(|| {
                        shape_bind_group(
                            &format!("art_object_{}_bind_group", instance.name),
                            instance.data.texture(),
                            instance.data.sampler(),
                        )
                    })
                    .clone();
                FezObjectRenderer::new(
                    Arc::clone(&instance.data.geometry),
                    bind_group,
                    instance.model_matrix,
                )
            })
            .collect();

        let quad = Arc::new(GeometryData::plane_quad(device));
        let background_planes = layout
            .background_planes
            .iter()
            .map(|plane| {
                let sampler =
                    texture::create_point_sampler(device, plane.address_mode_u, plane.address_mode_v);
                let bind_group = shape_bind_group(
                    &format!("background_plane_{}_bind_group", plane.name),
                    &plane.data.texture,
                    &sampler,
                );
                BackgroundPlaneRenderer::new(
                    plane.name.clone(),
                    Arc::clone(&quad),
                    sampler,
                    bind_group,
                    plane.model_matrix,
                    plane.raw_scale,
                    plane.double_sided,
                    plane.data.animation.clone(),
                    plane.phase,
                )
            })
            .collect();

        let sky_sampler = texture::create_default_sampler(device);
        let sky_bind_group = mk_texture_bind_group(
            device,
            &format!("sky_{}_bind_group", layout.sky.name),
            &pipelines.sky_texture_layout,
            &[(&layout.sky.background.view, &sky_sampler)],
        );
        let sky = SkyRenderer::new(layout.sky.name.clone(), sky_sampler, sky_bind_group);

        let renderer = Self {
            pipelines,
            sky,
            triles,
            art_objects,
            background_planes,
            base_diffuse: layout.base_diffuse,
            base_ambient: layout.base_ambient,
            _shadow_sampler: shadow_sampler,
            _shadow_texture: shadow_texture,
        };
        log::info!(
            "Built level: {} triles, {} art objects, {} background planes, sky {}",
            renderer.triles.len(),
            renderer.art_objects.len(),
            renderer.background_planes.len(),
            renderer.sky.name
        );
        Ok(renderer)
    }

    pub fn triles(&self) -> &[FezObjectRenderer] {
        &self.triles
    }

    pub fn art_objects(&self) -> &[FezObjectRenderer] {
        &self.art_objects
    }

    pub fn background_planes(&self) -> &[BackgroundPlaneRenderer] {
        &self.background_planes
    }
}

impl SceneGfx for FezRenderer {
    /// Sky first, then triles, art objects and background planes.
    fn prepare_to_render<'a>(&'a self, input: &ViewerInput, manager: &mut RenderInstManager<'a>) {
        let scene_offset = manager.allocate_uniform(&LevelSceneParams::new(&input.projection));
        let level = LevelRenderData::for_frame(&input.view, self.base_diffuse, self.base_ambient);

        self.sky.prepare_to_render(&self.pipelines, scene_offset, manager);
        for trile in &self.triles {
            trile.prepare_to_render(&self.pipelines, &level, scene_offset, input, manager);
        }
        for art_object in &self.art_objects {
            art_object.prepare_to_render(&self.pipelines, &level, scene_offset, input, manager);
        }
        for plane in &self.background_planes {
            plane.prepare_to_render(&self.pipelines, &level, scene_offset, input, manager);
        }
    }
}
