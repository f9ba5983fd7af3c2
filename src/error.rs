//! Error types for the lettercraft library.
//!
//! Two distinct types reflect two distinct failure modes:
//!
//! * [`LettercraftError`] — **Fatal**: the run cannot produce a document at
//!   all (conversion service rejected the PDF, neither encoding could decode
//!   the converted HTML, the generation reply had no parseable mapping).
//!   Returned as `Err(LettercraftError)` from the top-level `generate_*`
//!   functions. A fatal error never leaves a partial output file behind.
//!
//! * [`PipelineWarning`] — **Non-fatal**: the run completed and produced a
//!   document, but something degraded along the way (placeholder keys the
//!   model never filled, asset restoration cut short by structural drift).
//!   Collected in [`crate::output::TemplateOutput::warnings`] so callers can
//!   decide whether a degraded document is acceptable for their use.
//!
//! The pipeline deliberately optimises for "always produce a document" over
//! "perfectly correct document"; the warning channel is what keeps that
//! honest.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the lettercraft library.
///
/// Degraded-but-successful runs use [`PipelineWarning`] and are reported in
/// the output struct rather than propagated here.
#[derive(Debug, Error)]
pub enum LettercraftError {
    // ── Conversion-service errors ─────────────────────────────────────────
    /// The PDF-to-HTML conversion service returned a non-success status.
    #[error("Conversion service returned HTTP {status}: {body}")]
    ConversionFailed { status: u16, body: String },

    /// The conversion request itself could not be sent or timed out.
    #[error("Conversion request failed: {reason}")]
    ConversionRequestFailed { reason: String },

    /// The service accepted the PDF but the converted file could not be
    /// downloaded from the URL it returned.
    #[error("Failed to download converted HTML from '{url}': {reason}")]
    ConversionDownloadFailed { url: String, reason: String },

    /// The success reply did not contain a download URL.
    #[error("Conversion service reply had no file URL: {detail}")]
    ConversionReplyInvalid { detail: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// Converted HTML bytes decoded as neither UTF-8 nor windows-1252.
    #[error("Converted HTML could not be decoded as UTF-8 or windows-1252: {detail}")]
    DecodeFailed { detail: String },

    /// The converted document has no `<body>` to work on.
    #[error("Converted HTML has no <body> element")]
    MissingBody,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The LLM call exceeded the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    LlmTimeout { secs: u64 },

    /// The generation reply contained no parseable key→text mapping.
    #[error("Generation reply had no parseable mapping: {detail}")]
    MalformedReply { detail: String },

    /// The no-template path never produced a reply with a style block.
    #[error("No styled HTML after {attempts} attempts; giving up.\nThe model kept returning documents without a <style> block.")]
    StyleRetriesExhausted { attempts: u32 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output HTML file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal condition observed during a run.
///
/// Carried in the output struct; the run still completes and a document is
/// still written.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PipelineWarning {
    /// Some placeholder keys received no generated text; their literal
    /// `{{ key }}` tokens remain in the output document.
    #[error("{} placeholder(s) were not filled: {}", .keys.len(), .keys.join(", "))]
    PartialGeneration { keys: Vec<String> },

    /// The reassembled tree had fewer matching elements than were captured
    /// during stripping; restoration stopped at the shorter length.
    #[error("Structural drift while restoring {what}: captured {captured}, restored {restored}")]
    StructuralDrift {
        what: String,
        captured: usize,
        restored: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_failed_display() {
        let e = LettercraftError::ConversionFailed {
            status: 402,
            body: "Payment Required".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("402"), "got: {msg}");
        assert!(msg.contains("Payment Required"));
    }

    #[test]
    fn style_retries_display() {
        let e = LettercraftError::StyleRetriesExhausted { attempts: 4 };
        assert!(e.to_string().contains("4 attempts"));
    }

    #[test]
    fn partial_generation_display() {
        let w = PipelineWarning::PartialGeneration {
            keys: vec!["body2".into(), "heading1".into()],
        };
        let msg = w.to_string();
        assert!(msg.contains("2 placeholder(s)"));
        assert!(msg.contains("body2"));
    }

    #[test]
    fn structural_drift_display() {
        let w = PipelineWarning::StructuralDrift {
            what: "styles".into(),
            captured: 12,
            restored: 9,
        };
        let msg = w.to_string();
        assert!(msg.contains("captured 12"));
        assert!(msg.contains("restored 9"));
    }
}
