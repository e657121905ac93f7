//! Engine data structures: geometry, textures, bounds, and instances.
//!
//! - `bounds` holds axis-aligned boxes and the camera frustum test
//! - `geometry` contains the level vertex format and uploaded index/vertex buffers
//! - `instance` holds per-instance position/rotation/scale
//! - `texture` contains the GPU texture wrapper and sampler helpers

pub mod bounds;
pub mod geometry;
pub mod instance;
pub mod texture;
