//! Display collaborator: paints a named scene into a container.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::dom::{Element, Rgba};
use crate::{Error, Result};

/// Renders scene previews into containers
#[async_trait]
pub trait Displayer: Send + Sync {
    /// Paint the scene at `scene_path` into `container` at `width x height`.
    async fn scene_preview(
        &self,
        scene_path: &str,
        container: &mut Element,
        width: u32,
        height: u32,
    ) -> Result<()>;
}

/// A shape on a whiteboard scene, in scene coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    Rect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        color: Rgba,
    },
    /// Vector graphic, rendered as an `svg` node
    Vector {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        fill: Rgba,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Logical scene width
    pub width: u32,
    /// Logical scene height
    pub height: u32,
    #[serde(default)]
    pub background: Option<Rgba>,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, background: None, shapes: Vec::new() }
    }

    pub fn with_background(mut self, color: Rgba) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shapes.push(shape);
        self
    }
}

/// In-memory set of scenes addressed by path (scene directory + scene name)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneLibrary {
    #[serde(default)]
    scenes: BTreeMap<String, Scene>,
}

fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() || !path.starts_with('/') || path.ends_with('/') {
        return Err(Error::InvalidScenePath(path.to_string()));
    }
    Ok(())
}

impl SceneLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a library of the form `{"scenes": {"/dir/name": {...}}}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let lib: SceneLibrary = serde_json::from_str(json)?;
        for (path, scene) in &lib.scenes {
            validate_path(path)?;
            Self::validate_scene(path, scene)?;
        }
        Ok(lib)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn insert(&mut self, path: &str, scene: Scene) -> Result<()> {
        validate_path(path)?;
        Self::validate_scene(path, &scene)?;
        self.scenes.insert(path.to_string(), scene);
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&Scene> {
        self.scenes.get(path)
    }

    pub fn scene_paths(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    fn validate_scene(path: &str, scene: &Scene) -> Result<()> {
        if scene.width == 0 || scene.height == 0 {
            return Err(Error::ConfigError(format!("scene {} has an empty extent", path)));
        }
        Ok(())
    }
}

#[async_trait]
impl Displayer for SceneLibrary {
    async fn scene_preview(
        &self,
        scene_path: &str,
        container: &mut Element,
        width: u32,
        height: u32,
    ) -> Result<()> {
        validate_path(scene_path)?;
        let scene = self
            .get(scene_path)
            .ok_or_else(|| Error::SceneNotFound(scene_path.to_string()))?;

        container.clear_children();
        container.set_attribute("data-scene", scene_path);

        if let Some(bg) = scene.background {
            let mut backdrop = Element::positioned("div", 0, 0, width, height);
            backdrop.style.background = Some(bg);
            container.append_child(backdrop);
        }

        // Fit the whole scene, preserving aspect ratio, centred.
        let scale = f64::min(
            width as f64 / scene.width as f64,
            height as f64 / scene.height as f64,
        );
        let ox = (width as f64 - scene.width as f64 * scale) / 2.0;
        let oy = (height as f64 - scene.height as f64 * scale) / 2.0;
        let place = |x: i32, y: i32, w: u32, h: u32| {
            (
                (ox + x as f64 * scale).round() as i32,
                (oy + y as f64 * scale).round() as i32,
                (w as f64 * scale).round() as u32,
                (h as f64 * scale).round() as u32,
            )
        };

        for shape in &scene.shapes {
            let child = match *shape {
                Shape::Rect { x, y, width, height, color } => {
                    let (x, y, w, h) = place(x, y, width, height);
                    let mut div = Element::positioned("div", x, y, w, h);
                    div.style.background = Some(color);
                    div
                }
                Shape::Vector { x, y, width, height, fill } => {
                    let (x, y, w, h) = place(x, y, width, height);
                    // Sized by layout only; no width/height attributes.
                    let mut svg = Element::positioned("svg", x, y, w, h);
                    svg.set_attribute("viewBox", format!("0 0 {} {}", width, height));
                    svg.set_attribute("fill", fill.to_string());
                    svg
                }
            };
            container.append_child(child);
        }

        log::debug!(
            "Rendered scene {} ({} shapes) into {} at {}x{}",
            scene_path,
            scene.shapes.len(),
            container.id(),
            width,
            height
        );
        Ok(())
    }
}
