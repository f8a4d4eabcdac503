/// Rasterization collaborator: container in, pixel canvas out

use async_trait::async_trait;

use crate::dom::{Element, Rgba};
use crate::rendering::layout::layout_tree;
use crate::rendering::paint::{build_display_list, PaintCommand};
use crate::rendering::Canvas;
use crate::{Error, Result};

/// Last-chance mutation of the cloned tree before painting
pub type PreprocessHook = fn(Element) -> Element;

#[derive(Debug, Clone, Copy, Default)]
pub struct RasterOptions {
    /// Request cross-origin resources with CORS
    pub use_cors: bool,
    /// Applied to the clone, never to the live container
    pub preprocess: Option<PreprocessHook>,
}

#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, container: &Element, options: &RasterOptions) -> Result<Canvas>;
}

/// Longest canvas side accepted, matching common browser limits
pub const MAX_CANVAS_SIDE: u32 = 32_767;
/// Largest canvas area accepted, in pixels
pub const MAX_CANVAS_AREA: u64 = 268_435_456;

/// CPU rasterizer over the crate's element tree
#[derive(Debug, Clone)]
pub struct SoftwareRasterizer {
    /// Canvas fill used where the container has no background
    pub background: Rgba,
    /// Deepest element nesting accepted before giving up
    pub max_depth: usize,
    pub max_side: u32,
    pub max_area: u64,
}

impl Default for SoftwareRasterizer {
    fn default() -> Self {
        Self {
            background: Rgba::WHITE,
            max_depth: 256,
            max_side: MAX_CANVAS_SIDE,
            max_area: MAX_CANVAS_AREA,
        }
    }
}

impl SoftwareRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject containers whose canvas would exceed the configured limits.
    fn check_extent(&self, container: &Element) -> Result<()> {
        let (w, h) = (container.client_width(), container.client_height());
        let area = w as u64 * h as u64;
        if w > self.max_side || h > self.max_side || area > self.max_area {
            return Err(Error::Raster(format!(
                "{} is {}x{}, over the canvas limit ({} per side, {} pixels)",
                container.id(),
                w,
                h,
                self.max_side,
                self.max_area
            )));
        }
        Ok(())
    }

    /// Paint an already prepared tree.
    pub fn paint(&self, root: &Element) -> Result<Canvas> {
        let fill = root.style.background.unwrap_or(self.background);
        let mut canvas = Canvas::new(root.client_width(), root.client_height(), fill)?;
        let nodes = layout_tree(root);
        for cmd in build_display_list(&nodes) {
            match cmd {
                PaintCommand::SolidRect { rect, rgba } => canvas.fill_rect(&rect, rgba),
            }
        }
        Ok(canvas)
    }
}

#[async_trait]
impl Rasterizer for SoftwareRasterizer {
    async fn rasterize(&self, container: &Element, options: &RasterOptions) -> Result<Canvas> {
        if container.exceeds_depth(self.max_depth) {
            return Err(Error::Raster(format!(
                "{} nests deeper than {} levels",
                container.id(),
                self.max_depth
            )));
        }
        self.check_extent(container)?;

        let mut clone = container.deep_clone();
        if let Some(hook) = options.preprocess {
            clone = hook(clone);
        }
        self.check_extent(&clone)?;
        log::debug!(
            "Rasterizing {} at {}x{} (use_cors={})",
            container.id(),
            clone.client_width(),
            clone.client_height(),
            options.use_cors
        );
        self.paint(&clone)
    }
}
