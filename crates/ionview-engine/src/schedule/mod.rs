//! Frame scheduling.
//!
//! `FrameScheduler` turns host callbacks into ordered per-frame work.
//! The host is abstracted by `FrameHost` so the loop can be driven by the
//! window runtime or by tests.

mod host;
mod scheduler;

pub use host::{FrameHost, FrameRequests, FrameToken};
pub use scheduler::{CancelHandle, FrameOutcome, FrameScheduler, FrameStages, SchedulerState};
