//! Chunk mesh viewer: raw triangle-soup chunks drawn flat shaded from both
//! sides, one toggleable layer per mesh.

pub mod mesh;
pub mod normals;
pub mod renderer;

pub use mesh::{IvChunk, IvMesh};
pub use renderer::IvScene;
