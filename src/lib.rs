//! scenesnap
//!
//! Off-screen previews of whiteboard scenes. A scene is painted into a hidden
//! staging container, the container is rasterized into a pixel canvas, and
//! the canvas is handed back as a `data:` URL or as an image blob.
//!
//! # Features
//!
//! - **Pluggable collaborators**: the scene renderer (`Displayer`), the
//!   rasterizer (`Rasterizer`) and the hosting document (`SurfaceProvider`)
//!   are traits with headless reference implementations
//! - **Scoped staging**: the staging container is released on every exit
//!   path, including errors and dropped futures
//! - **Vector fixup**: vector graphics are sized explicitly on the
//!   rasterizer's clone, never on the live container
//!
//! # Example
//!
//! ```no_run
//! use scenesnap::{SceneLibrary, SnapshotConfig, SnapshotTool};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let library = SceneLibrary::from_path("scenes.json")?;
//! let config = SnapshotConfig {
//!     format: Some("image/jpeg".to_string()),
//!     quality: Some(0.8),
//!     ..Default::default()
//! };
//!
//! let tool = SnapshotTool::headless(library, config);
//! let url = tool.preview_data_url("/lesson/intro", 320, 240).await?;
//! println!("{}", url);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod display;
pub mod dom;
pub mod encode;
pub mod rendering;
pub mod snapshot;
pub mod surface;

pub use display::{Displayer, Scene, SceneLibrary, Shape};
pub use dom::{Element, ElementId, Rgba};
pub use encode::{Blob, ImageFormat};
pub use rendering::raster::{RasterOptions, Rasterizer, SoftwareRasterizer};
pub use rendering::Canvas;
pub use snapshot::SnapshotTool;
pub use surface::{HeadlessDocument, StagingContainer, SurfaceProvider};

/// Configuration for a `SnapshotTool`
///
/// Fixed for the lifetime of the tool; every capture reuses it. The defaults
/// follow the canvas platform:
/// - no `format` means `image/png`
/// - no `quality` means the encoder default (0.92 for lossy formats)
///
/// # Examples
///
/// ```
/// let cfg = scenesnap::SnapshotConfig::default();
/// assert!(cfg.use_cors);
/// assert!(cfg.format.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Output MIME type, e.g. `image/png` or `image/jpeg`
    pub format: Option<String>,
    /// Encoding quality in `0.0..=1.0` for lossy formats
    pub quality: Option<f32>,
    /// Ask the rasterizer to load cross-origin resources with CORS
    pub use_cors: bool,
    /// Upper bound on render + rasterize in milliseconds (None => unbounded)
    pub timeout_ms: Option<u64>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            format: None,
            quality: None,
            use_cors: true,
            timeout_ms: None,
        }
    }
}

impl SnapshotConfig {
    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: SnapshotConfig = serde_json::from_str(json)?;
        if let Some(q) = cfg.quality {
            if !(0.0..=1.0).contains(&q) {
                return Err(Error::ConfigError(format!("quality {} is outside 0..=1", q)));
            }
        }
        Ok(cfg)
    }

    /// Read a JSON configuration file.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// The resolved output format.
    pub fn image_format(&self) -> ImageFormat {
        ImageFormat::from_mime(self.format.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SnapshotConfig::default();
        assert!(config.use_cors);
        assert_eq!(config.timeout_ms, None);
        assert_eq!(config.image_format(), ImageFormat::Png);
    }

    #[test]
    fn test_config_from_json() {
        let config = SnapshotConfig::from_json(r#"{"format": "image/jpeg", "timeout_ms": 500}"#).unwrap();
        assert_eq!(config.image_format(), ImageFormat::Jpeg);
        assert_eq!(config.timeout_ms, Some(500));
        assert!(config.use_cors);

        let err = SnapshotConfig::from_json(r#"{"quality": 3.0}"#).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
