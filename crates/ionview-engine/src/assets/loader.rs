use std::future::Future;
use std::path::PathBuf;

use crate::scene::SceneAsset;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to import asset '{}'", .path.display())]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("asset '{source_name}' is invalid: {reason}")]
    Invalid { source_name: String, reason: String },
}

/// Asynchronous model source.
///
/// Awaited once at startup; a rejected load aborts startup.
pub trait AssetLoader {
    fn load(&self, source: &str) -> impl Future<Output = Result<SceneAsset, AssetError>>;
}
