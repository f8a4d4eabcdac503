/// Display list built from a laid-out tree

use crate::dom::{Element, Rgba};
use crate::rendering::layout::{LayoutNode, Rect};

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect { rect: Rect, rgba: Rgba },
}

/// Explicit `width`/`height` attributes of a vector node, if both parse.
fn sizing_attributes(element: &Element) -> Option<(u32, u32)> {
    let w = element.attribute("width")?.trim().trim_end_matches("px").parse().ok()?;
    let h = element.attribute("height")?.trim().trim_end_matches("px").parse().ok()?;
    Some((w, h))
}

/// Build paint commands for `nodes`. The first node is the captured root;
/// its background is the canvas fill and is not repeated here.
///
/// `svg` nodes are painted with their `fill` only when they carry explicit
/// sizing attributes; without them they come out blank.
pub fn build_display_list(nodes: &[LayoutNode<'_>]) -> Vec<PaintCommand> {
    let mut cmds = Vec::new();
    for node in nodes.iter().skip(1) {
        let el = node.element;
        if let Some(bg) = el.style.background {
            if !node.rect.is_empty() {
                cmds.push(PaintCommand::SolidRect { rect: node.rect, rgba: bg });
            }
        }
        if el.tag == "svg" {
            let Some((w, h)) = sizing_attributes(el) else {
                continue;
            };
            let fill = el.attribute("fill").and_then(Rgba::parse).unwrap_or(Rgba::BLACK);
            let rect = Rect {
                x: node.rect.x,
                y: node.rect.y,
                width: w.min(node.rect.width),
                height: h.min(node.rect.height),
            };
            if !rect.is_empty() {
                cmds.push(PaintCommand::SolidRect { rect, rgba: fill });
            }
        }
    }
    cmds
}
