//! Pre-capture fixups applied to the cloned tree.

use crate::dom::Element;

/// Stamp each vector graphic's rendered size onto its `width`/`height`
/// attributes.
///
/// The rasterizer draws `svg` nodes blank unless they carry explicit sizing
/// attributes, so this runs on the clone handed to it right before capture.
/// It takes the tree by value; the live container is never touched.
pub fn prepare_for_capture(mut snapshot: Element) -> Element {
    let mut stamped = 0usize;
    let mut stamp = |el: &mut Element| {
        if el.tag == "svg" {
            let (w, h) = (el.client_width(), el.client_height());
            el.set_attribute("width", w.to_string());
            el.set_attribute("height", h.to_string());
            stamped += 1;
        }
    };
    if snapshot.tag == "svg" {
        stamp(&mut snapshot);
    }
    snapshot.for_each_descendant_mut(&mut stamp);
    log::debug!("Stamped sizing attributes on {} vector node(s)", stamped);
    snapshot
}
