//! scene-viewer
//!
//! A wgpu viewer for two kinds of reverse-engineered game content: tile-based
//! levels described by an XML document (trile instances, art objects,
//! background planes and a sky) and chunked triangle-soup meshes drawn flat
//! shaded. Both run natively and on the web.
//!
//! High-level modules
//! - `camera`: free-fly camera, projection and input controller
//! - `chunk_mesh`: chunk mesh data, flat normal derivation and its scene
//! - `config`: viewer configuration and the asset root
//! - `context`: window, device, queue and surface
//! - `data_structures`: geometry, textures, bounds and instances
//! - `error`: typed level errors
//! - `flow`: the `SceneGfx` trait, frame rendering and the event loop
//! - `level`: level XML parsing, scene layout and level renderers
//! - `pipelines`: render pipelines and their shaders
//! - `render`: per-frame draw submissions and the uniform arena
//! - `resources`: asset file loading
//!

pub mod camera;
pub mod chunk_mesh;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod level;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
pub use winit::event::WindowEvent;

pub use config::ViewerConfig;
pub use error::LevelError;
pub use flow::{Layer, SceneConstructor, SceneGfx, ViewerInput, render_scene, run};
