//! Error types for scene snapshots

use thiserror::Error;

/// Result type alias for snapshot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing a scene preview
#[derive(Error, Debug)]
pub enum Error {
    /// The display collaborator does not know the requested scene
    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    /// The scene path is empty or not absolute
    #[error("Invalid scene path: {0:?}")]
    InvalidScenePath(String),

    /// The display collaborator failed to paint the scene
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// The container could not be turned into a pixel canvas
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// The canvas could not be encoded
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Attaching or detaching a container failed
    #[error("Surface error: {0}")]
    Surface(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration or scene library
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Encode(err.to_string())
    }
}
