//! Core engine-facing contracts.
//!
//! Defines the interface between the window runtime and the viewer: lifecycle
//! callbacks plus the per-frame context used to render and present.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{present_frame, FrameCtx, StartCtx, WindowCtx};
