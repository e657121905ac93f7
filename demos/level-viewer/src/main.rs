//! Opens a level from the asset root (`SCENE_VIEWER_ASSETS`, default
//! `./assets`). Background planes and the sky are read from disk; trile sets
//! and art objects need the game's packed containers, so every trile and art
//! object is stood in for by a textured unit cube.
//!
//! Usage: `level-viewer <LEVEL NAME>`

use std::{collections::HashMap, sync::Arc};

use anyhow::Context as _;
use scene_viewer::{
    ViewerConfig,
    context::InitContext,
    data_structures::{
        geometry::{GeometryData, LevelVertex},
        texture::{Texture, create_point_sampler},
    },
    flow::{SceneConstructor, SceneGfx},
    level::{
        FezRenderer, LevelDocument, ModelCache,
        cache::{ArtObjectData, TrilesetData},
    },
    resources, wgpu,
};

fn unit_cube(device: &wgpu::Device) -> GeometryData {
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for (normal, u, v) in FACES {
        let base = vertices.len() as u32;
        for (su, sv) in [(-0.5, -0.5), (-0.5, 0.5), (0.5, 0.5), (0.5, -0.5)] {
            let position = [0, 1, 2].map(|i| normal[i] * 0.5 + u[i] * su + v[i] * sv);
            vertices.push(LevelVertex {
                position,
                normal,
                tex_coord: [su + 0.5, 0.5 - sv],
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    GeometryData::new(device, "stand-in cube", &vertices, &indices)
}

/// Register stand-in geometry for everything `document` places.
fn add_stand_ins(ctx: &InitContext, document: &LevelDocument, cache: &mut ModelCache) {
    let cube = Arc::new(unit_cube(&ctx.device));
    let checker: Vec<u8> = (0..16)
        .flat_map(|i| if (i + i / 4) % 2 == 0 { [220, 210, 190, 255] } else { [160, 150, 130, 255] })
        .collect();
    let texture = || Texture::from_rgba(&ctx.device, &ctx.queue, &checker, 4, 4, Some("stand-in"));
    let sampler =
        || create_point_sampler(&ctx.device, wgpu::AddressMode::Repeat, wgpu::AddressMode::Repeat);

    let triles: HashMap<i32, Arc<GeometryData>> = document
        .triles
        .iter()
        .filter(|trile| trile.id >= 0)
        .map(|trile| (trile.id, cube.clone()))
        .collect();
    cache.add_trileset(TrilesetData {
        name: document.trile_set_name.clone(),
        texture: texture(),
        sampler: sampler(),
        triles,
    });
    for art_object in &document.art_objects {
        if cache.art_objects.resolve(&art_object.name).is_err() {
            cache.add_art_object(ArtObjectData {
                name: art_object.name.clone(),
                texture: texture(),
                sampler: sampler(),
                geometry: cube.clone(),
            });
        }
    }
}

fn main() -> anyhow::Result<()> {
    let level_name = std::env::args()
        .nth(1)
        .context("usage: level-viewer <LEVEL NAME>")?;
    let config = ViewerConfig {
        title: format!("level-viewer: {level_name}"),
        ..ViewerConfig::from_env()
    };

    let constructor: SceneConstructor = Box::new(move |ctx: InitContext| {
        Box::pin(async move {
            let root = ctx.config.asset_root.clone();
            let document = resources::load_level_document(&root, &level_name).await?;
            let mut cache = ModelCache::new();
            resources::load_level_assets(&root, &document, &ctx.device, &ctx.queue, &mut cache).await?;
            add_stand_ins(&ctx, &document, &mut cache);
            let scene = FezRenderer::new(
                &ctx.device,
                &ctx.queue,
                ctx.color_format,
                &ctx.uniform_layout,
                &cache,
                &document,
            )?;
            Ok(Box::new(scene) as Box<dyn SceneGfx>)
        })
    });
    scene_viewer::run(config, constructor)
}
