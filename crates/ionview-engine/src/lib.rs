//! ionview engine crate.
//!
//! Frame scheduling, keyframe animation, orbit camera and the post-processing
//! render chain behind the `ionview` model viewer, plus the window + GPU
//! runtime that drives them.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;
pub mod schedule;

pub mod logging;
pub mod config;
pub mod error;
pub mod render;
pub mod pipeline;

pub mod animation;
pub mod assets;
pub mod camera;
pub mod scene;
pub mod viewer;

pub use config::{ConfigError, ViewerConfig};
pub use error::ViewerError;
pub use viewer::Viewer;
