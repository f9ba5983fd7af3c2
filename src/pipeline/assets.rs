//! Asset stripping and restoration.
//!
//! Image source URLs and inline style strings are the two attribute families
//! that must not round-trip through the model: they are long, easy for a
//! model to mangle, and carry all of the template's visual identity. Before
//! the document goes anywhere near a prompt we capture both into ordered
//! lists; after reassembly we write them back positionally.
//!
//! ## The ordinal-correspondence invariant
//!
//! Restoration matches assets to elements purely by position: the Nth
//! captured source goes to the Nth `<img>`, the Nth captured style to the
//! Nth element. Capture and restore therefore MUST walk the `<body>` subtree
//! in the same deterministic depth-first document order — both sides use the
//! same traversal below. If generated text injects or destroys markup, the
//! walks diverge; restoration then stops at the shorter length and the
//! caller reports the drift instead of attaching assets to the wrong
//! elements.

use kuchiki::iter::NodeIterator;
use kuchiki::NodeRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ordered capture of image sources and inline styles for one document.
///
/// `styles` has one entry per element under `<body>` (in document order);
/// `None` marks an element that carried no `style` attribute. `image_sources`
/// has one entry per `<img>` in document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetRecord {
    pub image_sources: Vec<String>,
    pub styles: Vec<Option<String>>,
}

/// How much of an [`AssetRecord`] made it back into the document.
#[derive(Debug, Clone, Copy)]
pub struct RestoreReport {
    pub images_restored: usize,
    pub styles_restored: usize,
}

/// Capture every `<img src>` (clearing it) and every element's `style`
/// attribute (leaving it in place) under `body`, in document order.
pub fn strip_assets(body: &NodeRef) -> AssetRecord {
    let mut record = AssetRecord::default();

    let images: Vec<_> = match body.select("img") {
        Ok(iter) => iter.collect(),
        Err(()) => Vec::new(),
    };
    for image in images {
        let mut attrs = image.attributes.borrow_mut();
        let src = attrs.get("src").unwrap_or("").to_string();
        record.image_sources.push(src);
        attrs.insert("src", String::new());
    }

    for element in body.descendants().elements() {
        let attrs = element.attributes.borrow();
        record.styles.push(attrs.get("style").map(String::from));
    }

    debug!(
        images = record.image_sources.len(),
        styles = record.styles.len(),
        "stripped assets"
    );
    record
}

/// Write captured assets back into `body` positionally.
///
/// Never assigns past the captured list lengths; when the document now has
/// fewer matching elements than were captured, the remainder is simply not
/// restored and the shortfall shows up in the returned [`RestoreReport`].
pub fn restore_assets(body: &NodeRef, record: &AssetRecord) -> RestoreReport {
    let mut images_restored = 0;
    if let Ok(images) = body.select("img") {
        for (image, src) in images.zip(record.image_sources.iter()) {
            image.attributes.borrow_mut().insert("src", src.clone());
            images_restored += 1;
        }
    }

    let mut styles_restored = 0;
    for (element, style) in body.descendants().elements().zip(record.styles.iter()) {
        if let Some(style) = style {
            element.attributes.borrow_mut().insert("style", style.clone());
        }
        styles_restored += 1;
    }

    RestoreReport {
        images_restored,
        styles_restored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::dom;

    fn body(html: &str) -> NodeRef {
        dom::body_of(&dom::parse_document(html)).unwrap()
    }

    #[test]
    fn captures_one_source_per_image_in_order() {
        let body = body("<body><img src=\"a.png\"><div><img src=\"b.png\"></div><img></body>");
        let record = strip_assets(&body);
        assert_eq!(record.image_sources, ["a.png", "b.png", ""]);

        // Sources are cleared in the tree.
        let html = dom::serialize(&body).unwrap();
        assert!(!html.contains("a.png"));
        assert!(!html.contains("b.png"));
    }

    #[test]
    fn captures_one_style_slot_per_element() {
        let body = body(
            "<body><div style=\"color:red\"><p>x</p></div><p style=\"margin:0\">y</p></body>",
        );
        let record = strip_assets(&body);
        assert_eq!(
            record.styles,
            [
                Some("color:red".to_string()),
                None,
                Some("margin:0".to_string()),
            ]
        );
        // Styles are captured, not cleared.
        let html = dom::serialize(&body).unwrap();
        assert!(html.contains("color:red"));
    }

    #[test]
    fn restore_round_trips_identical_structure() {
        let original = "<body><div style=\"a:1\"><img src=\"x.png\" style=\"b:2\"></div></body>";
        let stripped = body(original);
        let record = strip_assets(&stripped);

        let restored = restore_assets(&stripped, &record);
        assert_eq!(restored.images_restored, record.image_sources.len());
        assert_eq!(restored.styles_restored, record.styles.len());

        let html = dom::serialize(&stripped).unwrap();
        assert!(html.contains("src=\"x.png\""));
        assert!(html.contains("style=\"a:1\""));
        assert!(html.contains("style=\"b:2\""));
    }

    #[test]
    fn restore_stops_at_captured_length() {
        let record = AssetRecord {
            image_sources: vec!["only.png".to_string()],
            styles: vec![Some("c:3".to_string())],
        };
        // Two images, three elements — more than was captured.
        let target = body("<body><img><img><p>x</p></body>");
        let report = restore_assets(&target, &record);
        assert_eq!(report.images_restored, 1);
        assert_eq!(report.styles_restored, 1);

        let html = dom::serialize(&target).unwrap();
        assert_eq!(html.matches("only.png").count(), 1);
    }

    #[test]
    fn restore_tolerates_shrunken_document() {
        let record = AssetRecord {
            image_sources: vec!["a.png".into(), "b.png".into()],
            styles: vec![Some("s:1".into()), None, Some("s:2".into())],
        };
        let target = body("<body><img></body>");
        let report = restore_assets(&target, &record);
        assert_eq!(report.images_restored, 1);
        assert_eq!(report.styles_restored, 1);
    }
}
