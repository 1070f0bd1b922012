//! Shared plumbing for the wgpu samples in `src/bin`.
//!
//! *   `basic_compute`: a compute shader fills a texture once, a textured quad shows it.
//! *   `msaa`: a triangle rendered offscreen at a selectable sample count, then blitted.
pub mod content;
pub mod framework;
pub mod graphics;
pub mod input;
pub mod settings;
