//! GPU rendering primitives.
//!
//! Passes own their GPU resources (pipelines, buffers, targets) and create
//! them lazily from a `RenderCtx`.
//!
//! Convention:
//! - world space is right-handed, +Y up
//! - intermediate targets are linear HDR (`HDR_FORMAT`)

mod color;
pub mod common;
mod ctx;
mod texture;

pub use color::{srgb_to_linear, Color};
pub use ctx::{RenderCtx, RenderTarget};
pub use texture::{RenderTexture, DEPTH_FORMAT, HDR_FORMAT};
