//! Shows a procedural chunk mesh: a terraced hill in one layer and a ring of
//! pillars in another. Keys 1 and 2 toggle them.

use scene_viewer::{
    ViewerConfig,
    chunk_mesh::{IvChunk, IvMesh, IvScene},
    context::InitContext,
    flow::{SceneConstructor, SceneGfx},
};

/// A `n` x `n` height field split into one chunk per row.
fn hill(n: u32) -> IvMesh {
    let height = |x: u32, z: u32| {
        let dx = x as f32 - n as f32 / 2.0;
        let dz = z as f32 - n as f32 / 2.0;
        (8.0 - (dx * dx + dz * dz).sqrt()).max(0.0).floor()
    };
    let chunks = (0..n)
        .map(|z| {
            let mut positions = Vec::new();
            for row in [z, z + 1] {
                for x in 0..=n {
                    positions.extend_from_slice(&[
                        x as f32 - n as f32 / 2.0,
                        height(x, row),
                        row as f32 - n as f32 / 2.0,
                    ]);
                }
            }
            let mut indices = Vec::new();
            for x in 0..n {
                let (a, b) = (x, x + 1);
                let (c, d) = (x + n + 1, x + n + 2);
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
            IvChunk::new(indices, positions)
        })
        .collect();
    IvMesh::new("hill", [0.35, 0.55, 0.3, 1.0], chunks)
}

fn pillars(count: u32) -> IvMesh {
    let chunks = (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            let (cx, cz) = (angle.cos() * 14.0, angle.sin() * 14.0);
            let mut positions = Vec::new();
            for y in [0.0, 6.0] {
                for (dx, dz) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
                    positions.extend_from_slice(&[cx + dx, y, cz + dz]);
                }
            }
            let mut indices = Vec::new();
            for side in 0..4 {
                let (a, b) = (side, (side + 1) % 4);
                indices.extend_from_slice(&[a, b, b + 4, a, b + 4, a + 4]);
            }
            indices.extend_from_slice(&[4, 5, 6, 4, 6, 7]);
            IvChunk::new(indices, positions)
        })
        .collect();
    IvMesh::new("pillars", [0.6, 0.5, 0.45, 1.0], chunks)
}

fn main() -> anyhow::Result<()> {
    let constructor: SceneConstructor = Box::new(|ctx: InitContext| {
        Box::pin(async move {
            let meshes = [hill(32), pillars(12)];
            log::info!(
                "Generated {} triangles",
                meshes.iter().map(IvMesh::triangle_count).sum::<usize>()
            );
            let scene = IvScene::new(&ctx.device, ctx.color_format, &ctx.uniform_layout, &meshes);
            Ok(Box::new(scene) as Box<dyn SceneGfx>)
        })
    });
    scene_viewer::run(ViewerConfig::default(), constructor)
}
