//! Asset loading.
//!
//! `AssetLoader` is the startup seam: the viewer awaits it once and never
//! schedules a frame if it fails. `GltfLoader` is the disk-backed default.

mod gltf_loader;
mod loader;

pub use gltf_loader::GltfLoader;
pub use loader::{AssetError, AssetLoader};
