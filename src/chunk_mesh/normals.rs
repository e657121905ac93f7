//! Flat-shaded expansion of indexed chunks.
//!
//! Chunks carry no normals, so every triangle is unpacked into three
//! vertices sharing the triangle's face normal. The result is drawn
//! without an index buffer.

use cgmath::{InnerSpace, Vector3};

/// Parallel vertex streams of an expanded chunk, one xyz triple per vertex.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ExpandedChunk {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
}

impl ExpandedChunk {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

fn position(positions: &[f32], index: u32) -> Vector3<f32> {
    let i = index as usize * 3;
    Vector3::new(positions[i], positions[i + 1], positions[i + 2])
}

/// `normalize(cross(p0 - p1, p0 - p2))`; NaN for degenerate triangles.
pub fn face_normal(p0: Vector3<f32>, p1: Vector3<f32>, p2: Vector3<f32>) -> Vector3<f32> {
    (p0 - p1).cross(p0 - p2).normalize()
}

/// Unpack `indices` into flat-shaded vertices.
///
/// # Panics
///
/// If an index is out of range for `positions` or the index count is not a
/// multiple of three.
pub fn expand_flat_shaded(positions: &[f32], indices: &[u32]) -> ExpandedChunk {
    assert!(
        indices.len() % 3 == 0,
        "index count {} is not a whole number of triangles",
        indices.len()
    );
    let mut expanded = ExpandedChunk {
        positions: Vec::with_capacity(indices.len() * 3),
        normals: Vec::with_capacity(indices.len() * 3),
    };
    for triangle in indices.chunks(3) {
        let p0 = position(positions, triangle[0]);
        let p1 = position(positions, triangle[1]);
        let p2 = position(positions, triangle[2]);
        let n = face_normal(p0, p1, p2);
        for p in [p0, p1, p2] {
            expanded.positions.extend_from_slice(&[p.x, p.y, p.z]);
            expanded.normals.extend_from_slice(&[n.x, n.y, n.z]);
        }
    }
    expanded
}
