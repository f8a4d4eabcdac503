//! Integration tests for the capture pipeline

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use scenesnap::rendering::layout::Rect;
use scenesnap::{
    Displayer, Element, ElementId, Error, HeadlessDocument, RasterOptions, Rasterizer, Result,
    Rgba, SceneLibrary, SnapshotConfig, SnapshotTool, SoftwareRasterizer, SurfaceProvider,
};

fn library() -> SceneLibrary {
    SceneLibrary::from_path("tests/fixtures/scenes.json").expect("load fixture library")
}

/// Headless document that remembers every container it handed out
#[derive(Default)]
struct RecordingDocument {
    inner: HeadlessDocument,
    created: Mutex<Vec<ElementId>>,
}

impl SurfaceProvider for RecordingDocument {
    fn create(&self, width: u32, height: u32) -> Element {
        let el = self.inner.create(width, height);
        self.created.lock().unwrap().push(el.id());
        el
    }

    fn attach(&self, element: &Element) -> Result<()> {
        self.inner.attach(element)
    }

    fn detach(&self, id: ElementId) -> Result<()> {
        self.inner.detach(id)
    }

    fn is_attached(&self, id: ElementId) -> bool {
        self.inner.is_attached(id)
    }

    fn attached_count(&self) -> usize {
        self.inner.attached_count()
    }
}

struct FailingDisplayer;

#[async_trait]
impl Displayer for FailingDisplayer {
    async fn scene_preview(&self, scene_path: &str, _: &mut Element, _: u32, _: u32) -> Result<()> {
        Err(Error::RenderError(format!("cannot render {}", scene_path)))
    }
}

struct StallingDisplayer;

#[async_trait]
impl Displayer for StallingDisplayer {
    async fn scene_preview(&self, _: &str, _: &mut Element, _: u32, _: u32) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

fn tool_with(
    displayer: Arc<dyn Displayer>,
    config: SnapshotConfig,
) -> (SnapshotTool, Arc<RecordingDocument>) {
    let doc = Arc::new(RecordingDocument::default());
    let tool = SnapshotTool::new(displayer, Arc::new(SoftwareRasterizer::new()), doc.clone(), config);
    (tool, doc)
}

fn decode_data_url(url: &str) -> image::RgbaImage {
    let payload = url.split_once(";base64,").expect("base64 data url").1;
    let bytes = BASE64.decode(payload).expect("valid base64");
    image::load_from_memory(&bytes).expect("decodable image").to_rgba8()
}

#[tokio::test]
async fn data_url_uses_default_png_type() {
    let (tool, _) = tool_with(Arc::new(library()), SnapshotConfig::default());
    let url = tool.preview_data_url("/lesson/intro", 400, 300).await.unwrap();
    assert!(url.starts_with("data:image/png;base64,"));

    let img = decode_data_url(&url);
    assert_eq!(img.dimensions(), (400, 300));
}

#[tokio::test]
async fn data_url_uses_configured_type() {
    let cfg = SnapshotConfig { format: Some("image/jpeg".into()), quality: Some(0.6), ..Default::default() };
    let (tool, _) = tool_with(Arc::new(library()), cfg);
    let url = tool.preview_data_url("/lesson/intro", 200, 150).await.unwrap();
    assert!(url.starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn staging_container_is_detached_after_success() {
    let (tool, doc) = tool_with(Arc::new(library()), SnapshotConfig::default());
    tool.preview_data_url("/lesson/intro", 100, 100).await.unwrap();
    tool.preview_blob("/lesson/summary", 100, 100).await.unwrap();

    let created = doc.created.lock().unwrap().clone();
    assert_eq!(created.len(), 2);
    assert_ne!(created[0], created[1]);
    assert!(created.iter().all(|id| !doc.is_attached(*id)));
    assert_eq!(doc.attached_count(), 0);
}

#[tokio::test]
async fn render_failure_rejects_and_still_releases_container() {
    let (tool, doc) = tool_with(Arc::new(FailingDisplayer), SnapshotConfig::default());

    let err = tool.preview_data_url("/lesson/intro", 100, 100).await.unwrap_err();
    assert!(matches!(err, Error::RenderError(_)));
    let err = tool.preview_blob("/lesson/intro", 100, 100).await.unwrap_err();
    assert!(matches!(err, Error::RenderError(_)));

    assert_eq!(doc.created.lock().unwrap().len(), 2);
    assert_eq!(doc.attached_count(), 0);
}

#[tokio::test]
async fn vector_fixup_makes_vector_region_visible() {
    let (tool, _) = tool_with(Arc::new(library()), SnapshotConfig::default());
    let mut container = Element::positioned("div", 0, 0, 400, 300);
    let canvas = tool.render_scene_into_container("/lesson/intro", &mut container).await.unwrap();

    let svg = container.descendants_by_tag("svg")[0];
    assert_eq!((svg.client_width(), svg.client_height()), (200, 150));
    let region = Rect { x: 100, y: 100, width: 200, height: 150 };
    assert!(!canvas.is_region_blank(&region, Rgba::WHITE));
    assert_eq!(canvas.pixel(150, 150), Some(Rgba(0xe0, 0x30, 0x30, 255)));

    // the live container keeps no sizing attributes
    assert_eq!(svg.attribute("width"), None);

    // the same container without the fixup captures a blank vector region
    let plain = SoftwareRasterizer::new()
        .rasterize(&container, &RasterOptions { use_cors: true, preprocess: None })
        .await
        .unwrap();
    assert!(plain.is_region_blank(&region, Rgba::WHITE));
}

#[tokio::test]
async fn unencodable_canvas_yields_no_blob() {
    let (tool, doc) = tool_with(Arc::new(library()), SnapshotConfig::default());
    let blob = tool.preview_blob("/blank", 0, 0).await.unwrap();
    assert!(blob.is_none());
    assert_eq!(tool.preview_data_url("/blank", 0, 0).await.unwrap(), "data:,");
    assert_eq!(doc.attached_count(), 0);
}

#[tokio::test]
async fn blob_carries_encoded_image() {
    let (tool, _) = tool_with(Arc::new(library()), SnapshotConfig::default());
    let blob = tool.preview_blob("/lesson/summary", 64, 48).await.unwrap().expect("blob");
    assert_eq!(blob.mime, "image/png");
    let img = image::load_from_memory(&blob.bytes).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (64, 48));
    assert_eq!(img.get_pixel(10, 10).0, [0x30, 0x50, 0xe0, 255]);
}

#[tokio::test]
async fn concurrent_captures_do_not_alias() {
    let (tool, doc) = tool_with(Arc::new(library()), SnapshotConfig::default());
    let (intro, summary) = futures::join!(
        tool.preview_data_url("/lesson/intro", 400, 300),
        tool.preview_data_url("/lesson/summary", 400, 300),
    );

    let intro = decode_data_url(&intro.unwrap());
    let summary = decode_data_url(&summary.unwrap());
    assert_eq!(intro.get_pixel(5, 5).0, [255, 255, 255, 255]);
    assert_eq!(intro.get_pixel(150, 150).0, [0xe0, 0x30, 0x30, 255]);
    assert_eq!(summary.get_pixel(5, 5).0, [0x30, 0x50, 0xe0, 255]);
    assert_eq!(summary.get_pixel(150, 150).0, [0x30, 0x50, 0xe0, 255]);

    assert_eq!(doc.created.lock().unwrap().len(), 2);
    assert_eq!(doc.attached_count(), 0);
}

#[tokio::test]
async fn configured_timeout_bounds_a_stalled_render() {
    let cfg = SnapshotConfig { timeout_ms: Some(50), ..Default::default() };
    let (tool, doc) = tool_with(Arc::new(StallingDisplayer), cfg);
    let err = tool.preview_data_url("/lesson/intro", 10, 10).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(50)));
    assert_eq!(doc.attached_count(), 0);
}

#[tokio::test]
async fn dropping_a_capture_releases_its_container() {
    let (tool, doc) = tool_with(Arc::new(StallingDisplayer), SnapshotConfig::default());
    let res = tokio::time::timeout(
        Duration::from_millis(50),
        tool.preview_blob("/lesson/intro", 10, 10),
    )
    .await;
    assert!(res.is_err());
    assert_eq!(doc.created.lock().unwrap().len(), 1);
    assert_eq!(doc.attached_count(), 0);
}

#[tokio::test]
async fn oversized_capture_is_an_error_not_a_crash() {
    let (tool, doc) = tool_with(Arc::new(library()), SnapshotConfig::default());
    for (w, h) in [(u32::MAX, u32::MAX), (100_000, 100_000)] {
        let err = tool.preview_data_url("/blank", w, h).await.unwrap_err();
        assert!(matches!(err, Error::Raster(_)), "{}x{}: {:?}", w, h, err);
        let err = tool.preview_blob("/blank", w, h).await.unwrap_err();
        assert!(matches!(err, Error::Raster(_)));
    }
    assert_eq!(doc.attached_count(), 0);
}
