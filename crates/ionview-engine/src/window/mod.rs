//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the viewer window, and wires them to the GPU
//! layer. Frames are delivered only while the app holds a pending request.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
