//! Document parsing: converted-HTML bytes → a mutable, traversable tree.
//!
//! ## Why a mutable DOM?
//!
//! The template round trip is strip-and-restore: placeholder extraction
//! rewrites paragraph contents in place, the asset stripper clears image
//! sources, and the reassembler later writes everything back. That demands a
//! tree we can mutate and re-serialize byte-faithfully, not a read-only
//! selector API.
//!
//! ## Encoding fallback
//!
//! The conversion service emits UTF-8 for most documents but windows-1252 for
//! templates authored in older Office toolchains (smart quotes, en dashes).
//! We try UTF-8 first and fall back to windows-1252; only if both decoders
//! report malformed input does the run abort with
//! [`LettercraftError::DecodeFailed`]. Markup itself is never validated —
//! the parser repairs what it can, which is the behaviour templates from
//! real-world converters need.

use crate::error::LettercraftError;
use encoding_rs::{UTF_8, WINDOWS_1252};
use kuchiki::traits::TendrilSink;
use kuchiki::NodeRef;
use tracing::debug;

/// Decode converted-HTML bytes, trying UTF-8 then windows-1252.
pub fn decode_html(bytes: &[u8]) -> Result<String, LettercraftError> {
    let (text, _, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return Ok(text.into_owned());
    }

    debug!("UTF-8 decode failed, falling back to windows-1252");
    let (text, _, had_errors) = WINDOWS_1252.decode(bytes);
    if !had_errors {
        return Ok(text.into_owned());
    }

    Err(LettercraftError::DecodeFailed {
        detail: format!("{} bytes, malformed in both encodings", bytes.len()),
    })
}

/// Parse HTML text into a mutable tree.
///
/// Parsing is permissive: unclosed tags, stray markup, and missing wrappers
/// are repaired rather than rejected, matching lenient-browser behaviour.
pub fn parse_document(html: &str) -> NodeRef {
    kuchiki::parse_html().one(html.to_string())
}

/// The `<body>` of a parsed document.
///
/// The html5ever tree builder synthesises `<body>` for any input, so this
/// only fails on pathological trees (e.g. a document node that was never
/// produced by [`parse_document`]).
pub fn body_of(document: &NodeRef) -> Result<NodeRef, LettercraftError> {
    document
        .select_first("body")
        .map(|body| body.as_node().clone())
        .map_err(|()| LettercraftError::MissingBody)
}

/// Serialize a node (and its subtree) back to HTML text.
pub fn serialize(node: &NodeRef) -> Result<String, LettercraftError> {
    let mut out = Vec::new();
    node.serialize(&mut out)
        .map_err(|e| LettercraftError::Internal(format!("HTML serialization failed: {e}")))?;
    String::from_utf8(out)
        .map_err(|e| LettercraftError::Internal(format!("serialized HTML not UTF-8: {e}")))
}
