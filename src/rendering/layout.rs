/// Box layout for a captured container
///
/// Boxes are resolved relative to the captured container, so its own
/// (off-screen) position never matters.

use crate::dom::{Element, Offset, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An element paired with its resolved box
#[derive(Debug, Clone)]
pub struct LayoutNode<'a> {
    pub rect: Rect,
    pub element: &'a Element,
}

fn resolve(offset: Offset, extent: u32) -> i32 {
    match offset {
        Offset::Px(px) => px,
        Offset::Percent(pct) => (extent as i64 * pct as i64 / 100) as i32,
    }
}

/// Lay out `root` and all descendants in paint (document) order.
/// - the root box sits at the origin with its rendered size
/// - absolute and fixed children are offset from their parent's box
/// - static children start at their parent's origin
pub fn layout_tree(root: &Element) -> Vec<LayoutNode<'_>> {
    let mut nodes = Vec::new();
    let rect = Rect { x: 0, y: 0, width: root.client_width(), height: root.client_height() };
    place(root, rect, &mut nodes);
    nodes
}

fn place<'a>(element: &'a Element, rect: Rect, nodes: &mut Vec<LayoutNode<'a>>) {
    nodes.push(LayoutNode { rect, element });
    for child in &element.children {
        let (dx, dy) = match child.style.position {
            Position::Static => (0, 0),
            Position::Absolute | Position::Fixed => (
                resolve(child.style.left, rect.width),
                resolve(child.style.top, rect.height),
            ),
        };
        let child_rect = Rect {
            x: rect.x.saturating_add(dx),
            y: rect.y.saturating_add(dy),
            width: child.client_width(),
            height: child.client_height(),
        };
        place(child, child_rect, nodes);
    }
}
