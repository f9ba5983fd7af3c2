//! Configuration types for newsletter generation.
//!
//! All behaviour is controlled through [`GenerationConfig`], built via its
//! [`GenerationConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across requests, log them, and diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::LettercraftError;
use crate::pipeline::extract::ClassMap;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// File name of the finished document inside a job directory.
pub const OUTPUT_FILENAME: &str = "newsletter.html";

/// The user's writing brief: what the newsletter is about and how it should
/// sound.
///
/// Ephemeral per request; the same brief drives both the template path and
/// the no-template path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brief {
    /// Subject of the newsletter (free text).
    pub topic: String,
    /// Desired tone, e.g. "informative", "celebratory", "formal".
    pub tone: String,
    /// Optional source material the copy should draw from. May be empty.
    pub content: String,
}

impl Brief {
    pub fn new(topic: impl Into<String>, tone: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            tone: tone.into(),
            content: String::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

impl Default for Brief {
    fn default() -> Self {
        Self {
            topic: String::new(),
            tone: "informative".to_string(),
            content: String::new(),
        }
    }
}

/// Configuration for a generation run.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use lettercraft::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .model("gpt-4.1-mini")
///     .max_style_retries(3)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// LLM model identifier, e.g. "gpt-4.1-nano", "gemini-2.0-flash".
    /// If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, uses `ProviderFactory::from_env()`.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for LLM completions. Default: 0.7.
    ///
    /// Newsletter copy benefits from some variety; 0.7 keeps the text lively
    /// without drifting off-topic. Lower it towards 0 for near-deterministic
    /// output in tests.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per call. Default: 8192.
    ///
    /// The no-template path returns an entire HTML document with an embedded
    /// stylesheet, which routinely exceeds 4 000 output tokens. Setting this
    /// too low silently truncates the document mid-tag.
    pub max_tokens: usize,

    /// Attempts for the no-template path before giving up when the model
    /// keeps omitting the `<style>` block. Default: 4.
    ///
    /// An uncapped loop here can spin forever on a model that persistently
    /// returns unstyled fragments, so exhaustion is a fatal
    /// [`LettercraftError::StyleRetriesExhausted`] instead.
    pub max_style_retries: u32,

    /// Endpoint of the PDF-to-HTML conversion service.
    pub convert_api_url: String,

    /// Bearer secret for the conversion service. Falls back to the
    /// `CONVERT_API_SECRET` environment variable when None.
    pub convert_api_secret: Option<String>,

    /// Conversion-service HTTP timeout in seconds. Default: 120.
    pub convert_timeout_secs: u64,

    /// Per-LLM-call timeout in seconds. Default: 90.
    pub api_timeout_secs: u64,

    /// Class→slot-type table and token-index rule used by the extractor.
    ///
    /// The defaults match the markup conventions of the supported converter;
    /// other converters may label paragraphs differently, so both the table
    /// and the "which class token carries the semantic name" rule are
    /// configurable here rather than hard-coded.
    pub class_map: ClassMap,

    /// Directory under which per-job output directories are created.
    /// Default: "generated".
    pub output_dir: PathBuf,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.7,
            max_tokens: 8192,
            max_style_retries: 4,
            convert_api_url: "https://v2.convertapi.com/convert/pdf/to/html".to_string(),
            convert_api_secret: None,
            convert_timeout_secs: 120,
            api_timeout_secs: 90,
            class_map: ClassMap::default(),
            output_dir: PathBuf::from("generated"),
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_style_retries", &self.max_style_retries)
            .field("convert_api_url", &self.convert_api_url)
            .field(
                "convert_api_secret",
                &self.convert_api_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("convert_timeout_secs", &self.convert_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("class_map", &self.class_map)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Mint a fresh job identifier for one run.
    ///
    /// Output artifacts are keyed per run so concurrent runs never race on a
    /// shared file; callers that want a stable serving location copy the
    /// finished artifact out themselves.
    pub fn new_job_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Where the finished document for `job_id` is written.
    pub fn job_output_path(&self, job_id: &str) -> PathBuf {
        self.output_dir.join(job_id).join(OUTPUT_FILENAME)
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_style_retries(mut self, n: u32) -> Self {
        self.config.max_style_retries = n.max(1);
        self
    }

    pub fn convert_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.convert_api_url = url.into();
        self
    }

    pub fn convert_api_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.convert_api_secret = Some(secret.into());
        self
    }

    pub fn convert_timeout_secs(mut self, secs: u64) -> Self {
        self.config.convert_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn class_map(mut self, map: ClassMap) -> Self {
        self.config.class_map = map;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, LettercraftError> {
        let c = &self.config;
        if c.max_style_retries == 0 {
            return Err(LettercraftError::InvalidConfig(
                "max_style_retries must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(LettercraftError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.convert_api_url.is_empty() {
            return Err(LettercraftError::InvalidConfig(
                "convert_api_url must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_build() {
        let config = GenerationConfig::builder().build().unwrap();
        assert_eq!(config.max_style_retries, 4);
        assert_eq!(config.temperature, 0.7);
        assert!(config.convert_api_url.contains("convertapi"));
    }

    #[test]
    fn temperature_is_clamped() {
        let config = GenerationConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(config.temperature, 2.0);
    }

    #[test]
    fn empty_convert_url_rejected() {
        let result = GenerationConfig::builder().convert_api_url("").build();
        assert!(matches!(result, Err(LettercraftError::InvalidConfig(_))));
    }

    #[test]
    fn job_output_path_is_keyed() {
        let config = GenerationConfig::default();
        let a = config.job_output_path("job-a");
        let b = config.job_output_path("job-b");
        assert_ne!(a, b);
        assert!(a.ends_with("job-a/newsletter.html"));
    }

    #[test]
    fn job_ids_are_unique() {
        assert_ne!(GenerationConfig::new_job_id(), GenerationConfig::new_job_id());
    }
}
