//! Time subsystem.
//!
//! Converts host timestamps into clamped frame deltas without coupling to the runtime.
//! Intended usage:
//! - one `Timeline` per runtime, producing millisecond timestamps
//! - one `FrameClock` per render loop, owned by the frame scheduler

mod frame_clock;
mod timeline;

pub use frame_clock::{FrameClock, FrameTime, DEFAULT_MAX_FRAME_DELTA};
pub use timeline::Timeline;
