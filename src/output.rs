//! Result types returned by the top-level generation functions.

use crate::error::PipelineWarning;
use crate::pipeline::extract::SlotType;
use serde::{Deserialize, Serialize};

/// One placeholder as reported to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholderReport {
    pub key: String,
    pub slot: SlotType,
    pub budget: usize,
    /// Whether the model's value had to be truncated to fit the budget.
    pub truncated: bool,
    /// Whether the model supplied any value at all.
    pub filled: bool,
}

/// Counters and timings for one template-path run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    pub placeholder_count: usize,
    pub images_captured: usize,
    pub styles_captured: usize,
    pub truncated_values: usize,
    pub missing_keys: usize,
    pub convert_ms: u64,
    pub llm_ms: u64,
    pub total_ms: u64,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Everything the template path produces for one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateOutput {
    /// Job identifier the output artifacts are keyed under.
    pub job_id: String,
    /// The finished newsletter document.
    pub html: String,
    /// Per-placeholder outcome, in document order.
    pub placeholders: Vec<PlaceholderReport>,
    /// Non-fatal degradations observed during the run.
    pub warnings: Vec<PipelineWarning>,
    pub stats: GenerationStats,
}

impl TemplateOutput {
    /// True when every placeholder was filled and nothing drifted.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Everything the no-template path produces for one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScratchOutput {
    pub job_id: String,
    pub html: String,
    /// Layout attempts used (1 means the first reply was styled).
    pub attempts: u32,
    pub llm_ms: u64,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_output_has_no_warnings() {
        let output = TemplateOutput {
            job_id: "j".into(),
            html: "<html></html>".into(),
            placeholders: vec![],
            warnings: vec![],
            stats: GenerationStats::default(),
        };
        assert!(output.is_clean());
    }

    #[test]
    fn output_serializes_for_json_consumers() {
        let output = TemplateOutput {
            job_id: "j".into(),
            html: "<p>x</p>".into(),
            placeholders: vec![PlaceholderReport {
                key: "title1".into(),
                slot: SlotType::Title,
                budget: 50,
                truncated: true,
                filled: true,
            }],
            warnings: vec![PipelineWarning::PartialGeneration {
                keys: vec!["body2".into()],
            }],
            stats: GenerationStats::default(),
        };
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"title1\""));
        assert!(json.contains("\"slot\":\"title\""));
    }
}
