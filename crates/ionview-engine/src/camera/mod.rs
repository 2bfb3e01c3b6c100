//! Camera and orbit interaction.

mod orbit;
mod perspective;

pub use orbit::{polar_angle, OrbitController, OrbitSettings};
pub use perspective::{CameraError, PerspectiveCamera};
