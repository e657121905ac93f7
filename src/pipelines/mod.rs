//! Render pipelines. Every pipeline layout starts with the uniform arena
//! layout at group 0.

pub mod basic;
pub mod chunk;
pub mod level;
