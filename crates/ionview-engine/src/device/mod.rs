//! GPU device + surface management.
//!
//! Owns the wgpu instance, adapter, device, queue and the window surface.
//! Frames are acquired and presented here; what gets recorded into them is
//! up to the render pipeline.

mod context;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use frame::{GpuFrame, SurfaceErrorAction};
pub use init::GpuInit;
