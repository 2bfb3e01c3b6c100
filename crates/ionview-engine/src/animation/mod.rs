//! Keyframe animation.
//!
//! Clips are sampled on the CPU and written into scene node transforms;
//! world matrices are refreshed by the scene afterwards.

mod clip;
mod library;
mod mixer;

pub use clip::{AnimationClip, Interpolation, Track, TrackSample, TrackValues};
pub use library::ClipLibrary;
pub use mixer::{AnimationError, AnimationMixer};
