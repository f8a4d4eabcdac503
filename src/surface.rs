//! Surface provider: the document that hosts staging containers.
//!
//! Capturing a scene needs a container that is laid out but invisible. The
//! provider hands those out and tracks which ones are attached;
//! `StagingContainer` ties one container's attachment to a scope.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use crate::dom::{Element, ElementId, Offset, Position, Rgba, Style};
use crate::{Error, Result};

/// Capability to create and host off-screen containers
pub trait SurfaceProvider: Send + Sync {
    /// Create a detached container of the given rendered size.
    fn create(&self, width: u32, height: u32) -> Element;

    /// Attach a container to the document.
    fn attach(&self, element: &Element) -> Result<()>;

    /// Detach a previously attached container.
    fn detach(&self, id: ElementId) -> Result<()>;

    fn is_attached(&self, id: ElementId) -> bool;

    fn attached_count(&self) -> usize;
}

/// Headless document keeping a registry of attached containers
#[derive(Debug, Default)]
pub struct HeadlessDocument {
    attached: Mutex<BTreeSet<ElementId>>,
}

impl HeadlessDocument {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SurfaceProvider for HeadlessDocument {
    fn create(&self, width: u32, height: u32) -> Element {
        // Fixed just past the bottom-right corner of the viewport and behind
        // everything else, so the render never flashes or takes input.
        let mut div = Element::new("div");
        div.style = Style {
            position: Position::Fixed,
            left: Offset::Percent(100),
            top: Offset::Percent(100),
            width,
            height,
            background: Some(Rgba::WHITE),
            z_index: -1,
        };
        div
    }

    fn attach(&self, element: &Element) -> Result<()> {
        let mut attached = self.attached.lock().unwrap();
        if !attached.insert(element.id()) {
            return Err(Error::Surface(format!("{} is already attached", element.id())));
        }
        Ok(())
    }

    fn detach(&self, id: ElementId) -> Result<()> {
        let mut attached = self.attached.lock().unwrap();
        if !attached.remove(&id) {
            return Err(Error::Surface(format!("{} is not attached", id)));
        }
        Ok(())
    }

    fn is_attached(&self, id: ElementId) -> bool {
        self.attached.lock().unwrap().contains(&id)
    }

    fn attached_count(&self) -> usize {
        self.attached.lock().unwrap().len()
    }
}

/// A staging container attached for the lifetime of this value.
///
/// Dropping it detaches the container, whichever way the owning scope exits.
pub struct StagingContainer {
    surfaces: Arc<dyn SurfaceProvider>,
    element: Element,
}

impl StagingContainer {
    /// Create a `width x height` container and attach it.
    pub fn provision(surfaces: Arc<dyn SurfaceProvider>, width: u32, height: u32) -> Result<Self> {
        let element = surfaces.create(width, height);
        surfaces.attach(&element)?;
        log::debug!("Provisioned staging container {} ({}x{})", element.id(), width, height);
        Ok(Self { surfaces, element })
    }

    pub fn id(&self) -> ElementId {
        self.element.id()
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }
}

impl Drop for StagingContainer {
    fn drop(&mut self) {
        match self.surfaces.detach(self.element.id()) {
            Ok(()) => log::debug!("Released staging container {}", self.element.id()),
            Err(e) => log::warn!("Failed to release staging container {}: {}", self.element.id(), e),
        }
    }
}
