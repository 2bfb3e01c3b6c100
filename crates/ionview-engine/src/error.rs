use thiserror::Error;

use crate::animation::AnimationError;
use crate::assets::AssetError;
use crate::camera::CameraError;
use crate::config::ConfigError;
use crate::pipeline::PipelineError;

/// Startup failures of the viewer.
///
/// Clock regressions are not errors; they are counted and logged by the
/// frame clock.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to load asset")]
    AssetLoad(#[from] AssetError),

    #[error("no animation clip to play")]
    MissingClip(#[from] AnimationError),

    #[error("invalid camera setup")]
    InvalidCamera(#[from] CameraError),

    #[error("invalid configuration")]
    Config(#[from] ConfigError),

    #[error("failed to assemble the render pipeline")]
    Pipeline(#[from] PipelineError),
}
