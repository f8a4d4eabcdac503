//! Preview capture orchestrator
//!
//! `SnapshotTool` sequences the three collaborators for one capture:
//! provision a hidden staging container, have the displayer paint the scene
//! into it, rasterize it, release it, then encode the canvas.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::display::{Displayer, SceneLibrary};
use crate::dom::Element;
use crate::encode::{self, Blob};
use crate::rendering::prepare::prepare_for_capture;
use crate::rendering::raster::{RasterOptions, Rasterizer, SoftwareRasterizer};
use crate::rendering::Canvas;
use crate::surface::{HeadlessDocument, StagingContainer, SurfaceProvider};
use crate::{Error, Result, SnapshotConfig};

/// Renders scene previews off-screen and returns them as images
#[derive(Clone)]
pub struct SnapshotTool {
    displayer: Arc<dyn Displayer>,
    rasterizer: Arc<dyn Rasterizer>,
    surfaces: Arc<dyn SurfaceProvider>,
    config: SnapshotConfig,
}

impl SnapshotTool {
    pub fn new(
        displayer: Arc<dyn Displayer>,
        rasterizer: Arc<dyn Rasterizer>,
        surfaces: Arc<dyn SurfaceProvider>,
        config: SnapshotConfig,
    ) -> Self {
        Self { displayer, rasterizer, surfaces, config }
    }

    /// A tool backed by the headless document and the software rasterizer.
    pub fn headless(library: SceneLibrary, config: SnapshotConfig) -> Self {
        Self::new(
            Arc::new(library),
            Arc::new(SoftwareRasterizer::new()),
            Arc::new(HeadlessDocument::new()),
            config,
        )
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    pub fn surfaces(&self) -> &Arc<dyn SurfaceProvider> {
        &self.surfaces
    }

    /// Capture `scene_path` at `width x height` as a `data:` URL.
    pub async fn preview_data_url(&self, scene_path: &str, width: u32, height: u32) -> Result<String> {
        let canvas = self.capture(scene_path, width, height).await?;
        encode::to_data_url(&canvas, self.config.format.as_deref(), self.config.quality)
    }

    /// Capture `scene_path` at `width x height` as an image blob.
    ///
    /// `Ok(None)` means the canvas could not be encoded.
    pub async fn preview_blob(&self, scene_path: &str, width: u32, height: u32) -> Result<Option<Blob>> {
        let canvas = self.capture(scene_path, width, height).await?;
        encode::to_blob(canvas, self.config.format.as_deref(), self.config.quality)
            .wait()
            .await
    }

    /// Render `scene_path` into a caller-supplied container at its rendered
    /// size and rasterize it.
    ///
    /// Vector graphics get their sizing attributes stamped on the
    /// rasterizer's clone; `container` itself only receives the rendered
    /// scene.
    pub async fn render_scene_into_container(
        &self,
        scene_path: &str,
        container: &mut Element,
    ) -> Result<Canvas> {
        let (width, height) = (container.client_width(), container.client_height());
        let options = RasterOptions {
            use_cors: self.config.use_cors,
            preprocess: Some(prepare_for_capture),
        };
        let steps = async {
            self.displayer.scene_preview(scene_path, container, width, height).await?;
            self.rasterizer.rasterize(container, &options).await
        };
        self.with_timeout(steps).await
    }

    async fn capture(&self, scene_path: &str, width: u32, height: u32) -> Result<Canvas> {
        log::debug!("Capturing {} at {}x{}", scene_path, width, height);
        let mut staging = StagingContainer::provision(self.surfaces.clone(), width, height)?;
        let canvas = self.render_scene_into_container(scene_path, staging.element_mut()).await?;
        drop(staging);
        Ok(canvas)
    }

    async fn with_timeout<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.config.timeout_ms {
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), fut)
                .await
                .map_err(|_| Error::Timeout(ms))?,
            None => fut.await,
        }
    }
}
