//! Minimal element tree used as the rendering surface.
//!
//! This is not a general DOM. It carries just enough structure for a display
//! collaborator to paint a scene into a container (tags, attributes, a small
//! positioned style) and for a rasterizer to read that back.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique element identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        ElementId(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const WHITE: Rgba = Rgba(255, 255, 255, 255);
    pub const BLACK: Rgba = Rgba(0, 0, 0, 255);
    pub const TRANSPARENT: Rgba = Rgba(0, 0, 0, 0);

    /// Parse `#rrggbb`, `#rrggbbaa` or one of the keywords `white`, `black`
    /// and `transparent`.
    pub fn parse(s: &str) -> Option<Rgba> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "white" => return Some(Rgba::WHITE),
            "black" => return Some(Rgba::BLACK),
            "transparent" => return Some(Rgba::TRANSPARENT),
            _ => {}
        }
        let hex = s.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Rgba(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.0, self.1, self.2, self.3]
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.3 == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.0, self.1, self.2, self.3)
        }
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Rgba::parse(&value).ok_or_else(|| format!("invalid colour {:?}", value))
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> Self {
        c.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Static,
    Absolute,
    Fixed,
}

/// A `left`/`top` offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offset {
    Px(i32),
    /// Percentage of the containing block (the viewport for fixed elements)
    Percent(u32),
}

impl Default for Offset {
    fn default() -> Self {
        Offset::Px(0)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub position: Position,
    pub left: Offset,
    pub top: Offset,
    /// Laid-out width in pixels
    pub width: u32,
    /// Laid-out height in pixels
    pub height: u32,
    pub background: Option<Rgba>,
    pub z_index: i32,
}

/// An element in the surface tree
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    id: ElementId,
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub style: Style,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            id: ElementId::next(),
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            style: Style::default(),
            children: Vec::new(),
        }
    }

    /// Convenience constructor for an absolutely positioned child box.
    pub fn positioned(tag: &str, x: i32, y: i32, width: u32, height: u32) -> Self {
        let mut el = Element::new(tag);
        el.style = Style {
            position: Position::Absolute,
            left: Offset::Px(x),
            top: Offset::Px(y),
            width,
            height,
            ..Default::default()
        };
        el
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Rendered width, the equivalent of `clientWidth`
    pub fn client_width(&self) -> u32 {
        self.style.width
    }

    /// Rendered height, the equivalent of `clientHeight`
    pub fn client_height(&self) -> u32 {
        self.style.height
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn append_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// All descendants (not including `self`) with the given tag, in
    /// document order.
    pub fn descendants_by_tag(&self, tag: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        for child in &self.children {
            child.collect_by_tag(tag, &mut out);
        }
        out
    }

    fn collect_by_tag<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        if self.tag.eq_ignore_ascii_case(tag) {
            out.push(self);
        }
        for child in &self.children {
            child.collect_by_tag(tag, out);
        }
    }

    /// Visit every descendant mutably, depth first.
    pub fn for_each_descendant_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        for child in &mut self.children {
            f(child);
            child.for_each_descendant_mut(f);
        }
    }

    /// Maximum nesting depth below this element (a leaf has depth 0).
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((el, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(el.children.iter().map(|c| (c, depth + 1)));
        }
        max
    }

    /// Whether any descendant sits more than `limit` levels below this
    /// element. Stops walking as soon as the limit is crossed.
    pub fn exceeds_depth(&self, limit: usize) -> bool {
        let mut stack = vec![(self, 0usize)];
        while let Some((el, depth)) = stack.pop() {
            if depth > limit {
                return true;
            }
            stack.extend(el.children.iter().map(|c| (c, depth + 1)));
        }
        false
    }

    /// Independent copy of the subtree. Ids are preserved so the copy can be
    /// correlated with the live tree.
    pub fn deep_clone(&self) -> Element {
        self.clone()
    }
}

impl Drop for Element {
    // Unlink children onto a heap stack so dropping a deep tree does not
    // recurse once per level.
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut el) = stack.pop() {
            stack.append(&mut el.children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_colours() {
        assert_eq!(Rgba::parse("#ff0000"), Some(Rgba(255, 0, 0, 255)));
        assert_eq!(Rgba::parse("#00ff0080"), Some(Rgba(0, 255, 0, 128)));
        assert_eq!(Rgba::parse("White"), Some(Rgba::WHITE));
        assert_eq!(Rgba::parse("#fff"), None);
        assert_eq!(Rgba::parse("red"), None);
        assert_eq!(Rgba(1, 2, 3, 255).to_string(), "#010203");
    }

    #[test]
    fn colour_serde_uses_strings() {
        let c: Rgba = serde_json::from_str("\"#102030\"").unwrap();
        assert_eq!(c, Rgba(0x10, 0x20, 0x30, 255));
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"#102030\"");
        assert!(serde_json::from_str::<Rgba>("\"nope\"").is_err());
    }

    #[test]
    fn element_ids_are_unique() {
        let a = Element::new("div");
        let b = Element::new("div");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.deep_clone().id(), a.id());
    }

    #[test]
    fn descendants_by_tag_walks_nested_children() {
        let mut root = Element::new("div");
        let mut group = Element::new("div");
        group.append_child(Element::new("SVG"));
        root.append_child(group);
        root.append_child(Element::new("svg"));
        assert_eq!(root.descendants_by_tag("svg").len(), 2);
        assert_eq!(root.depth(), 2);
    }

    #[test]
    fn depth_of_deep_chain_is_computed_iteratively() {
        let mut root = Element::new("div");
        for _ in 0..100_000 {
            let mut parent = Element::new("div");
            parent.append_child(root);
            root = parent;
        }
        assert_eq!(root.depth(), 100_000);
        assert!(root.exceeds_depth(99_999));
        assert!(!root.exceeds_depth(100_000));
        assert!(root.exceeds_depth(3));
    }
}
