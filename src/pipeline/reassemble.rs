//! Reassembly: substitute generated text into the tokenised template and
//! restore the stripped assets.
//!
//! Substitution is plain string replacement on the serialized document, not a
//! DOM walk. The tokens were written as the sole text child of their
//! paragraphs, so `{{ key }}` appears in the markup exactly where the text
//! belongs and a literal replace cannot touch attributes or tags. Keys with
//! no generated value keep their literal token — a visibly unfinished slot is
//! more useful to an editor than a silently deleted one.
//!
//! After substitution the document is re-parsed and assets are restored
//! positionally. Generated text is only ever inserted where text already was,
//! so the element structure normally matches the stripped tree exactly; when
//! it does not (a value smuggled markup in), restoration stops early and the
//! shortfall is reported as a [`PipelineWarning::StructuralDrift`].

use crate::error::{LettercraftError, PipelineWarning};
use crate::pipeline::assets::{restore_assets, AssetRecord};
use crate::pipeline::dom;
use crate::pipeline::extract::token_for;
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Replace each `{{ key }}` token with its generated value.
///
/// Keys absent from `values` are left alone; values for keys whose token is
/// not present in `html` replace nothing. Both are valid outcomes, not
/// errors.
pub fn substitute(html: &str, values: &IndexMap<String, String>) -> String {
    let mut out = html.to_string();
    for (key, value) in values {
        out = out.replace(&token_for(key), value);
    }
    out
}

/// Substitute values, re-parse, and restore assets.
///
/// Returns the final serialized HTML plus any drift warnings. The returned
/// document always parses — it came out of the parser one line earlier.
pub fn reassemble(
    template_html: &str,
    values: &IndexMap<String, String>,
    record: &AssetRecord,
) -> Result<(String, Vec<PipelineWarning>), LettercraftError> {
    let substituted = substitute(template_html, values);

    let document = dom::parse_document(&substituted);
    let body = dom::body_of(&document)?;
    let report = restore_assets(&body, record);

    let mut warnings = Vec::new();
    if report.images_restored < record.image_sources.len() {
        warnings.push(PipelineWarning::StructuralDrift {
            what: "image sources".to_string(),
            captured: record.image_sources.len(),
            restored: report.images_restored,
        });
    }
    if report.styles_restored < record.styles.len() {
        warnings.push(PipelineWarning::StructuralDrift {
            what: "styles".to_string(),
            captured: record.styles.len(),
            restored: report.styles_restored,
        });
    }
    for warning in &warnings {
        warn!(%warning, "asset restoration fell short");
    }

    let html = dom::serialize(&document)?;
    debug!(bytes = html.len(), warnings = warnings.len(), "reassembled document");
    Ok((html, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_exact_tokens_only() {
        let html = "<p>{{ title1 }}</p><p>{{title1}}</p>";
        let out = substitute(html, &values(&[("title1", "Spring Gala")]));
        assert!(out.contains("<p>Spring Gala</p>"));
        // Malformed token (no inner spaces) is not ours to replace.
        assert!(out.contains("{{title1}}"));
    }

    #[test]
    fn missing_values_leave_tokens_in_place() {
        let html = "<p>{{ body1 }}</p><p>{{ body2 }}</p>";
        let out = substitute(html, &values(&[("body1", "Welcome")]));
        assert!(out.contains("Welcome"));
        assert!(out.contains("{{ body2 }}"));
    }

    #[test]
    fn reassemble_restores_assets_after_substitution() {
        let template = "<html><body>\
                        <img src=\"\"><p style=\"color:red\">{{ body1 }}</p>\
                        </body></html>";
        let record = AssetRecord {
            image_sources: vec!["hero.png".to_string()],
            styles: vec![None, Some("color:red".to_string())],
        };

        let (html, warnings) =
            reassemble(template, &values(&[("body1", "All staff welcome")]), &record).unwrap();
        assert!(html.contains("All staff welcome"));
        assert!(html.contains("src=\"hero.png\""));
        assert!(warnings.is_empty());
    }

    #[test]
    fn drift_is_reported_not_fatal() {
        // Record claims two images; the document only has one.
        let template = "<html><body><img src=\"\"><p>{{ body1 }}</p></body></html>";
        let record = AssetRecord {
            image_sources: vec!["a.png".to_string(), "b.png".to_string()],
            styles: vec![None, None],
        };

        let (html, warnings) = reassemble(template, &values(&[("body1", "x")]), &record).unwrap();
        assert!(html.contains("a.png"));
        assert!(!html.contains("b.png"));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            PipelineWarning::StructuralDrift { captured: 2, restored: 1, .. }
        ));
    }

    #[test]
    fn value_injecting_markup_still_produces_a_document() {
        let template = "<html><body><p style=\"m:0\">{{ body1 }}</p></body></html>";
        let record = AssetRecord {
            image_sources: vec![],
            styles: vec![Some("m:0".to_string())],
        };
        let injected = values(&[("body1", "<div><div><div>deep</div></div></div>")]);

        let (html, _warnings) = reassemble(template, &injected, &record).unwrap();
        assert!(html.contains("deep"));
    }
}
