//! Level scene: XML level documents placed and drawn with cached assets.
//!
//! - `xml` parses a level file into owned descriptors
//! - `cache` holds the pre-loaded trile sets, art objects, planes and skies
//! - `layout` resolves descriptors against the cache and freezes model matrices
//! - `animation` picks the frame of animated background planes
//! - `uniforms` holds the shader blocks and per-frame level parameters
//! - `objects` and `renderer` turn a layout into draw submissions

pub mod animation;
pub mod cache;
pub mod layout;
pub mod objects;
pub mod renderer;
pub mod uniforms;
pub mod xml;

pub use cache::ModelCache;
pub use renderer::FezRenderer;
pub use xml::LevelDocument;
