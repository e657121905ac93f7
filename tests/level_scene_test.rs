#![cfg(feature = "integration-tests")]

mod common;

use std::{collections::HashMap, sync::Arc};

use cgmath::{Deg, Matrix4};
use scene_viewer::{
    LevelError,
    camera::{Camera, Projection},
    data_structures::{
        geometry::{GeometryData, LevelVertex},
        texture::{Texture, create_default_sampler},
    },
    flow::{ViewerInput, render_scene},
    level::{
        FezRenderer, LevelDocument, ModelCache,
        animation::{AnimationFrame, PlaneAnimation, TexRect},
        cache::{ArtObjectData, BackgroundPlaneData, SkyData, TrilesetData},
    },
};

const LEVEL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Level name="TEST" trileSetName="Village" skyName="Blue" baseDiffuse="1" baseAmbient="0.35">
  <Triles>
    <Entry><TrileInstance trileId="3" orientation="0"><Position><Vector3 x="0" y="0" z="0" /></Position></TrileInstance></Entry>
    <Entry><TrileInstance trileId="-1" orientation="0"><Position><Vector3 x="1" y="0" z="0" /></Position></TrileInstance></Entry>
    <Entry><TrileInstance trileId="3" orientation="2"><Position><Vector3 x="-1" y="0" z="0" /></Position></TrileInstance></Entry>
  </Triles>
  <ArtObjects>
    <Entry key="0">
      <ArtObjectInstance name="TreeAO">
        <Position><Vector3 x="0" y="1" z="0" /></Position>
        <Rotation><Quaternion x="0" y="0" z="0" w="1" /></Rotation>
        <Scale><Vector3 x="1" y="1" z="1" /></Scale>
      </ArtObjectInstance>
    </Entry>
  </ArtObjects>
  <BackgroundPlanes>
    <Entry key="0">
      <BackgroundPlane textureName="Waterfall_A" doubleSided="False" xTextureRepeat="False" yTextureRepeat="False" clampTexture="False">
        <Position><Vector3 x="0" y="0" z="-2" /></Position>
        <Rotation><Quaternion x="0" y="0" z="0" w="1" /></Rotation>
        <Scale><Vector3 x="1" y="1" z="1" /></Scale>
      </BackgroundPlane>
    </Entry>
  </BackgroundPlanes>
</Level>"#;

fn cube(device: &wgpu::Device) -> GeometryData {
    let mut vertices = Vec::new();
    for x in [-0.5, 0.5] {
        for y in [-0.5, 0.5] {
            for z in [-0.5, 0.5] {
                vertices.push(LevelVertex {
                    position: [x, y, z],
                    normal: [x * 2.0, 0.0, 0.0],
                    tex_coord: [x + 0.5, y + 0.5],
                });
            }
        }
    }
    let indices = [
        0, 1, 3, 0, 3, 2, 4, 6, 7, 4, 7, 5, 0, 4, 5, 0, 5, 1, 2, 3, 7, 2, 7, 6, 0, 2, 6, 0, 6, 4, 1,
        5, 7, 1, 7, 3,
    ];
    GeometryData::new(device, "cube", &vertices, &indices)
}

fn cache(device: &wgpu::Device, queue: &wgpu::Queue) -> ModelCache {
    let solid = |colour, w, h, label| Texture::solid(colour, w, h, device, queue, label);
    let geometry = Arc::new(cube(device));
    let mut cache = ModelCache::new();
    cache.add_trileset(TrilesetData {
        name: "Village".to_string(),
        texture: solid([200, 180, 120, 255], 4, 4, "trileset"),
        sampler: create_default_sampler(device),
        triles: HashMap::from([(3, geometry.clone())]),
    });
    cache.add_art_object(ArtObjectData {
        name: "TreeAO".to_string(),
        texture: solid([20, 160, 40, 255], 4, 4, "tree"),
        sampler: create_default_sampler(device),
        geometry,
    });
    cache.add_background_plane(BackgroundPlaneData::new(
        "Waterfall_A",
        solid([40, 80, 255, 128], 32, 16, "waterfall"),
        None,
    ));
    cache.add_sky(SkyData {
        name: "blue".to_string(),
        background: solid([90, 140, 230, 255], 1, 8, "sky"),
        shadows: Vec::new(),
    });
    cache
}

fn input_looking(yaw: f32) -> ViewerInput {
    let camera = Camera::new((0.0, 0.0, 600.0), Deg(yaw), Deg(0.0));
    let projection = Projection::new(common::SIZE, common::SIZE, Deg(45.0), 1.0, 4000.0);
    ViewerInput::new(&camera, &projection, 0.25, common::SIZE, common::SIZE)
}

#[test]
fn builds_one_renderer_per_resolved_instance() {
    let Some(gpu) = common::headless() else {
        return;
    };
    let cache = cache(&gpu.device, &gpu.queue);
    let document = LevelDocument::parse(LEVEL).unwrap();
    let scene = FezRenderer::new(
        &gpu.device,
        &gpu.queue,
        common::COLOR_FORMAT,
        gpu.arena.layout(),
        &cache,
        &document,
    )
    .unwrap();

    assert_eq!(scene.triles().len(), 2);
    assert_eq!(scene.art_objects().len(), 1);
    assert_eq!(scene.background_planes().len(), 1);

    let expected = Matrix4::from_scale(50.0) * Matrix4::from_translation([-0.5, 0.5, -0.5].into());
    assert_eq!(*scene.art_objects()[0].model_matrix(), expected);
}

#[test]
fn submits_sky_objects_and_planes() {
    let Some(mut gpu) = common::headless() else {
        return;
    };
    let cache = cache(&gpu.device, &gpu.queue);
    let document = LevelDocument::parse(LEVEL).unwrap();
    let scene = FezRenderer::new(
        &gpu.device,
        &gpu.queue,
        common::COLOR_FORMAT,
        gpu.arena.layout(),
        &cache,
        &document,
    )
    .unwrap();

    // looking down -Z at the origin: everything is in view
    let drawn = render_scene(
        &gpu.device,
        &gpu.queue,
        &mut gpu.arena,
        &scene,
        &input_looking(-90.0),
        &gpu.target_view,
        &gpu.depth.view,
        wgpu::Color::BLACK,
    );
    assert_eq!(drawn, 5);

    // looking away: triles and the art object are culled, sky and plane stay
    let drawn = render_scene(
        &gpu.device,
        &gpu.queue,
        &mut gpu.arena,
        &scene,
        &input_looking(90.0),
        &gpu.target_view,
        &gpu.depth.view,
        wgpu::Color::BLACK,
    );
    assert_eq!(drawn, 2);
}

#[test]
fn sky_covers_the_clear_colour() {
    let Some(mut gpu) = common::headless() else {
        return;
    };
    let cache = cache(&gpu.device, &gpu.queue);
    let document = LevelDocument::parse(LEVEL).unwrap();
    let scene = FezRenderer::new(
        &gpu.device,
        &gpu.queue,
        common::COLOR_FORMAT,
        gpu.arena.layout(),
        &cache,
        &document,
    )
    .unwrap();

    render_scene(
        &gpu.device,
        &gpu.queue,
        &mut gpu.arena,
        &scene,
        &input_looking(90.0),
        &gpu.target_view,
        &gpu.depth.view,
        wgpu::Color::RED,
    );
    let data = gpu.read_target();
    // a corner pixel sees only the sky
    let [r, _, b, _] = common::Headless::pixel(&data, 0, 0);
    assert!(b > r, "expected sky blue, got r={r} b={b}");
}

#[test]
fn unknown_art_object_fails_construction() {
    let Some(gpu) = common::headless() else {
        return;
    };
    let mut cache = cache(&gpu.device, &gpu.queue);
    cache.art_objects = scene_viewer::level::cache::Catalog::new(LevelError::UnknownArtObject);
    let document = LevelDocument::parse(LEVEL).unwrap();
    let err = FezRenderer::new(
        &gpu.device,
        &gpu.queue,
        common::COLOR_FORMAT,
        gpu.arena.layout(),
        &cache,
        &document,
    )
    .unwrap_err();
    assert!(matches!(err, LevelError::UnknownArtObject(name) if name.eq_ignore_ascii_case("treeao")));
}

#[test]
fn animated_planes_advance_their_frame_rectangle() {
    let Some(mut gpu) = common::headless() else {
        return;
    };
    let mut cache = cache(&gpu.device, &gpu.queue);
    let frames = (0..2)
        .map(|i| AnimationFrame {
            duration: 0.5,
            rect: TexRect::from_pixels(i * 16, 0, 16, 16, 32, 16),
        })
        .collect();
    cache.add_background_plane(BackgroundPlaneData::new(
        "Waterfall_A",
        Texture::solid([40, 80, 255, 128], 32, 16, &gpu.device, &gpu.queue, "waterfall atlas"),
        Some(PlaneAnimation::new(16, 16, frames)),
    ));
    let document = LevelDocument::parse(LEVEL).unwrap();
    let scene = FezRenderer::new(
        &gpu.device,
        &gpu.queue,
        common::COLOR_FORMAT,
        gpu.arena.layout(),
        &cache,
        &document,
    )
    .unwrap();

    let plane = &scene.background_planes()[0];
    // the first plane starts at phase zero
    assert_eq!(plane.tex_scale_bias(0.25), [0.5, 1.0, 0.0, 0.0]);
    assert_eq!(plane.tex_scale_bias(0.75), [0.5, 1.0, 0.5, 0.0]);
    assert_eq!(plane.tex_scale_bias(1.25), plane.tex_scale_bias(0.25));
    // world width comes from one frame, not the whole atlas
    assert_eq!(plane.model_matrix().x.x, 50.0);

    let drawn = render_scene(
        &gpu.device,
        &gpu.queue,
        &mut gpu.arena,
        &scene,
        &input_looking(-90.0),
        &gpu.target_view,
        &gpu.depth.view,
        wgpu::Color::BLACK,
    );
    assert_eq!(drawn, 5);
}
