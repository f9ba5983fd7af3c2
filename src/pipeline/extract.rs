//! Placeholder extraction: classify text paragraphs and replace their content
//! with uniquely-keyed `{{ key }}` tokens.
//!
//! The converter labels every paragraph with style classes ("title",
//! "heading-2", "body-text", …). We map those to a closed set of slot types,
//! assign each matched paragraph a key like `heading2` or `body5`, and
//! remember how long the original text was so the budget stage can keep the
//! generated copy from overflowing the fixed layout.
//!
//! Everything here mutates the tree in place: inline formatting spans are
//! unwrapped and the paragraph's children are replaced by a single text node
//! holding the token. No original text survives in the tree — only its
//! length, recorded in the returned map.

use indexmap::IndexMap;
use kuchiki::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Semantic category of a text-bearing element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    Title,
    Heading,
    Body,
}

impl SlotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotType::Title => "title",
            SlotType::Heading => "heading",
            SlotType::Body => "body",
        }
    }

    /// Character budget used when a slot has no recorded original length.
    pub fn default_budget(&self) -> usize {
        match self {
            SlotType::Title => 60,
            SlotType::Heading => 80,
            SlotType::Body => 200,
        }
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted slot: its type and the trimmed length of the text it
/// replaced. `original_len` is `None` only for synthetic slots that never had
/// source text (the budget stage then falls back to a per-type default).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placeholder {
    pub slot: SlotType,
    pub original_len: Option<usize>,
}

/// Placeholder key → slot record, in document order.
pub type PlaceholderMap = IndexMap<String, Placeholder>;

/// The literal token written into the tree for `key`.
pub fn token_for(key: &str) -> String {
    format!("{{{{ {key} }}}}")
}

static HEADING_LEVEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^heading-\d+$").expect("HEADING_LEVEL_RE: hardcoded regex is valid")
});

/// Class-name → slot-type table plus the token-index rule.
///
/// The converter we target emits class lists where the *second* token carries
/// the semantic name (the first is a generic block marker), so the default
/// `token_index` is 1. Both the table and the index are configurable because
/// this convention is specific to one converter's markup and may not
/// generalise.
#[derive(Debug, Clone)]
pub struct ClassMap {
    entries: HashMap<String, SlotType>,
    token_index: usize,
}

impl Default for ClassMap {
    fn default() -> Self {
        let mut entries = HashMap::new();
        for name in ["title"] {
            entries.insert(name.to_string(), SlotType::Title);
        }
        for name in ["heading-1", "heading-2", "heading-3"] {
            entries.insert(name.to_string(), SlotType::Heading);
        }
        for name in ["body-text", "paragraph", "list-paragraph", "table-paragraph"] {
            entries.insert(name.to_string(), SlotType::Body);
        }
        Self {
            entries,
            token_index: 1,
        }
    }
}

impl ClassMap {
    /// An empty table with the given token index; populate via [`ClassMap::with_class`].
    pub fn new(token_index: usize) -> Self {
        Self {
            entries: HashMap::new(),
            token_index,
        }
    }

    /// Add or override one class-name mapping.
    pub fn with_class(mut self, name: impl Into<String>, slot: SlotType) -> Self {
        self.entries.insert(name.into(), slot);
        self
    }

    /// Which whitespace-separated class token carries the semantic name.
    pub fn token_index(&self) -> usize {
        self.token_index
    }

    /// Classify a single class token.
    ///
    /// Exact table matches win; otherwise `heading-<digits>` maps to
    /// heading and any token containing "body" maps to body.
    fn lookup(&self, token: &str) -> Option<SlotType> {
        if let Some(slot) = self.entries.get(token) {
            return Some(*slot);
        }
        if HEADING_LEVEL_RE.is_match(token) {
            return Some(SlotType::Heading);
        }
        if token.contains("body") {
            return Some(SlotType::Body);
        }
        None
    }

    /// Classify a full `class` attribute value.
    ///
    /// A single token is used as-is. With more tokens, the token at
    /// `token_index` is preferred; if it is unrecognised, the first token is
    /// tried as a fallback.
    pub fn classify(&self, class_attr: &str) -> Option<SlotType> {
        let tokens: Vec<&str> = class_attr.split_whitespace().collect();
        let first = *tokens.first()?;
        let pick = *tokens.get(self.token_index).unwrap_or(&first);

        self.lookup(pick)
            .or_else(|| if pick != first { self.lookup(first) } else { None })
    }
}

/// Walk every paragraph in document order, replacing recognised ones with
/// placeholder tokens.
///
/// Mutates `document` in place and returns the key → slot map. Ordinals are
/// assigned per slot type, starting at 1, in document order — so keys are
/// unique within one document by construction. Paragraphs with no class, or
/// with no recognised class token, are left untouched.
pub fn extract_placeholders(document: &NodeRef, class_map: &ClassMap) -> PlaceholderMap {
    let mut placeholders = PlaceholderMap::new();
    let mut counters: HashMap<SlotType, usize> = HashMap::new();

    // Collect before mutating: rewriting children while the selector
    // iterator is live would walk a tree we are editing.
    let paragraphs: Vec<_> = match document.select("p") {
        Ok(iter) => iter.collect(),
        Err(()) => return placeholders,
    };

    for paragraph in paragraphs {
        let class_attr = {
            let attrs = paragraph.attributes.borrow();
            match attrs.get("class") {
                Some(value) => value.to_string(),
                None => continue,
            }
        };

        let Some(slot) = class_map.classify(&class_attr) else {
            continue;
        };

        let ordinal = counters.entry(slot).or_insert(0);
        *ordinal += 1;
        let key = format!("{}{}", slot.as_str(), ordinal);

        let original_len = paragraph.text_contents().trim().chars().count();

        // Drop inline formatting (spans etc.) along with the text itself:
        // the leaf becomes a single text node holding the token.
        let node = paragraph.as_node();
        let children: Vec<NodeRef> = node.children().collect();
        for child in children {
            child.detach();
        }
        node.append(NodeRef::new_text(token_for(&key)));

        debug!(key, slot = %slot, original_len, "extracted placeholder");
        placeholders.insert(
            key,
            Placeholder {
                slot,
                original_len: Some(original_len),
            },
        );
    }

    placeholders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::dom;

    fn extract(html: &str) -> (NodeRef, PlaceholderMap) {
        let doc = dom::parse_document(html);
        let map = extract_placeholders(&doc, &ClassMap::default());
        (doc, map)
    }

    #[test]
    fn classifies_known_class_names() {
        let map = ClassMap::default();
        assert_eq!(map.classify("title"), Some(SlotType::Title));
        assert_eq!(map.classify("heading-2"), Some(SlotType::Heading));
        assert_eq!(map.classify("table-paragraph"), Some(SlotType::Body));
    }

    #[test]
    fn second_token_wins_then_first_token_fallback() {
        let map = ClassMap::default();
        // Two tokens: the second is the semantic one.
        assert_eq!(map.classify("block heading-7"), Some(SlotType::Heading));
        // Second token unrecognised: fall back to the first.
        assert_eq!(map.classify("title mystery"), Some(SlotType::Title));
    }

    #[test]
    fn substring_and_pattern_fallbacks() {
        let map = ClassMap::default();
        assert_eq!(map.classify("custom-body-wrap"), Some(SlotType::Body));
        assert_eq!(map.classify("heading-12"), Some(SlotType::Heading));
        assert_eq!(map.classify("nonsense"), None);
        assert_eq!(map.classify(""), None);
    }

    #[test]
    fn heading_pattern_requires_trailing_digits_only() {
        let map = ClassMap::default();
        assert_eq!(map.classify("heading-x"), None);
        assert_eq!(map.classify("heading-2x"), None);
    }

    #[test]
    fn ordinals_are_per_slot_and_contiguous() {
        let (_, map) = extract(
            "<body>\
             <p class=\"title\">T</p>\
             <p class=\"block body-text\">one</p>\
             <p class=\"heading-1\">H</p>\
             <p class=\"paragraph\">two</p>\
             </body>",
        );
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, ["title1", "body1", "heading1", "body2"]);
    }

    #[test]
    fn replaces_content_with_token_and_unwraps_spans() {
        let (doc, map) = extract(
            "<body><p class=\"x title\"><span style=\"font-weight:bold\">Spring</span> Gala</p></body>",
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map["title1"].original_len, Some(11));

        let html = dom::serialize(&doc).unwrap();
        assert!(html.contains("{{ title1 }}"), "got: {html}");
        assert!(!html.contains("Spring"), "original text must not survive");
        assert!(!html.contains("<span"), "inline spans must be unwrapped");
    }

    #[test]
    fn unrecognised_paragraphs_are_untouched() {
        let (doc, map) = extract("<body><p class=\"nonsense\">keep me</p><p>and me</p></body>");
        assert!(map.is_empty());
        let html = dom::serialize(&doc).unwrap();
        assert!(html.contains("keep me"));
        assert!(html.contains("and me"));
    }

    #[test]
    fn original_len_is_trimmed_char_count() {
        let (_, map) = extract("<body><p class=\"body-text\">  héllo  </p></body>");
        assert_eq!(map["body1"].original_len, Some(5));
    }
}
