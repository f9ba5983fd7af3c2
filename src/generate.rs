//! Top-level generation entry points.
//!
//! Both paths run strictly sequentially: every stage needs the previous
//! stage's complete output (there are no per-page units of work to fan out),
//! so one job is one linear pass. Concurrency lives *between* jobs — each run
//! is self-contained, shares nothing mutable, and writes its artifacts under
//! a job-keyed directory, so callers may run any number of jobs in parallel.
//!
//! A fatal error aborts the run before anything is written; the `*_to_file`
//! variants write atomically (temp file + rename) so a crash mid-write never
//! leaves a partial document at the final path.

use crate::config::{Brief, GenerationConfig};
use crate::error::{LettercraftError, PipelineWarning};
use crate::output::{GenerationStats, PlaceholderReport, ScratchOutput, TemplateOutput};
use crate::pipeline::{assets, budget, convert, dom, extract, llm, reassemble, scratch};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Generate a newsletter from a PDF template.
///
/// This is the primary entry point for the library. `filename` labels the
/// upload for the conversion service and does not need to exist on disk.
///
/// # Returns
/// `Ok(TemplateOutput)` on success, even when some placeholders went
/// unfilled or asset restoration fell short (check `output.warnings`).
///
/// # Errors
/// Returns `Err(LettercraftError)` only for fatal conditions: conversion
/// rejected or unreachable, undecodable HTML, no `<body>`, provider not
/// configured, or a generation reply with no parseable mapping.
pub async fn generate_from_template(
    pdf_bytes: &[u8],
    filename: &str,
    brief: &Brief,
    config: &GenerationConfig,
) -> Result<TemplateOutput, LettercraftError> {
    let total_start = Instant::now();
    let job_id = GenerationConfig::new_job_id();
    info!(job_id, filename, "starting template generation");

    // ── Step 1: Get/create provider ──────────────────────────────────────
    let provider = resolve_provider(config)?;

    // ── Step 2: Convert PDF to HTML ──────────────────────────────────────
    let convert_start = Instant::now();
    let html_bytes = convert::pdf_to_html(pdf_bytes, filename, config).await?;
    let convert_ms = convert_start.elapsed().as_millis() as u64;
    info!(bytes = html_bytes.len(), convert_ms, "PDF converted");

    // ── Step 3: Decode and parse ─────────────────────────────────────────
    let html = dom::decode_html(&html_bytes)?;
    let document = dom::parse_document(&html);
    let body = dom::body_of(&document)?;

    // ── Step 4: Extract placeholders ─────────────────────────────────────
    let placeholders = extract::extract_placeholders(&document, &config.class_map);
    info!(count = placeholders.len(), "placeholders extracted");

    // ── Step 5: Strip assets ─────────────────────────────────────────────
    let record = assets::strip_assets(&body);

    // ── Step 6: Compute budgets ──────────────────────────────────────────
    let budgets = budget::compute_budgets(&placeholders);

    // ── Step 7: Generate content ─────────────────────────────────────────
    let llm_start = Instant::now();
    let generated = llm::generate_content(&provider, brief, &budgets, config).await?;
    let llm_ms = llm_start.elapsed().as_millis() as u64;
    debug!(values = generated.values.len(), llm_ms, "content generated");

    // ── Step 8: Reassemble ───────────────────────────────────────────────
    let template_html = dom::serialize(&document)?;
    let (final_html, mut warnings) =
        reassemble::reassemble(&template_html, &generated.values, &record)?;

    let missing = llm::missing_keys(&generated.values, &budgets);
    if !missing.is_empty() {
        warn!(keys = ?missing, "placeholders left unfilled");
        warnings.insert(0, PipelineWarning::PartialGeneration {
            keys: missing.clone(),
        });
    }

    // ── Step 9: Compute stats ────────────────────────────────────────────
    let reports: Vec<PlaceholderReport> = placeholders
        .iter()
        .map(|(key, placeholder)| PlaceholderReport {
            key: key.clone(),
            slot: placeholder.slot,
            budget: budgets[key],
            truncated: generated.truncated.contains(key),
            filled: generated.values.contains_key(key),
        })
        .collect();

    let stats = GenerationStats {
        placeholder_count: placeholders.len(),
        images_captured: record.image_sources.len(),
        styles_captured: record.styles.len(),
        truncated_values: generated.truncated.len(),
        missing_keys: missing.len(),
        convert_ms,
        llm_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
        input_tokens: generated.input_tokens,
        output_tokens: generated.output_tokens,
    };

    info!(
        job_id,
        placeholders = stats.placeholder_count,
        warnings = warnings.len(),
        total_ms = stats.total_ms,
        "template generation complete"
    );

    Ok(TemplateOutput {
        job_id,
        html: final_html,
        placeholders: reports,
        warnings,
        stats,
    })
}

/// Generate from a template and write the document under the job directory.
///
/// The document lands at `<output_dir>/<job_id>/newsletter.html`, written
/// atomically. Returns the full output so the caller still sees warnings and
/// stats.
pub async fn generate_from_template_to_file(
    pdf_bytes: &[u8],
    filename: &str,
    brief: &Brief,
    config: &GenerationConfig,
) -> Result<TemplateOutput, LettercraftError> {
    let output = generate_from_template(pdf_bytes, filename, brief, config).await?;
    let path = config.job_output_path(&output.job_id);
    write_atomic(&path, &output.html).await?;
    info!(path = %path.display(), "newsletter written");
    Ok(output)
}

/// Generate a newsletter with no template at all.
///
/// Polishes the brief's content into newsletter prose, then asks for a
/// complete styled HTML document, retrying (up to `max_style_retries`) while
/// replies lack an embedded `<style>` block.
pub async fn generate_from_prompt(
    brief: &Brief,
    config: &GenerationConfig,
) -> Result<ScratchOutput, LettercraftError> {
    let start = Instant::now();
    let job_id = GenerationConfig::new_job_id();
    info!(job_id, "starting no-template generation");

    let provider = resolve_provider(config)?;
    let document = scratch::generate_document(&provider, brief, config).await?;

    let output = ScratchOutput {
        job_id,
        html: document.html,
        attempts: document.attempts,
        llm_ms: start.elapsed().as_millis() as u64,
        input_tokens: document.input_tokens,
        output_tokens: document.output_tokens,
    };
    info!(
        job_id = output.job_id,
        attempts = output.attempts,
        llm_ms = output.llm_ms,
        "no-template generation complete"
    );
    Ok(output)
}

/// No-template generation, written under the job directory like
/// [`generate_from_template_to_file`].
pub async fn generate_from_prompt_to_file(
    brief: &Brief,
    config: &GenerationConfig,
) -> Result<ScratchOutput, LettercraftError> {
    let output = generate_from_prompt(brief, config).await?;
    let path = config.job_output_path(&output.job_id);
    write_atomic(&path, &output.html).await?;
    info!(path = %path.display(), "newsletter written");
    Ok(output)
}

/// Synchronous wrapper around [`generate_from_template`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_from_template_sync(
    pdf_bytes: &[u8],
    filename: &str,
    brief: &Brief,
    config: &GenerationConfig,
) -> Result<TemplateOutput, LettercraftError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| LettercraftError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(generate_from_template(pdf_bytes, filename, brief, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Atomic write: write to temp, then rename.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), LettercraftError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LettercraftError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("html.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| LettercraftError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| LettercraftError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Resolve the LLM provider, in priority order:
///
/// 1. **Pre-constructed provider** (`config.provider`) — full control for
///    callers that need custom middleware (caching, rate-limiting).
///
/// 2. **Named provider + model** (`config.provider_name`) — we call
///    [`ProviderFactory::create_llm_provider`] which reads the corresponding
///    API key (`OPENAI_API_KEY`, etc.) from the environment.
///
/// 3. **Environment pair** (`LETTERCRAFT_LLM_PROVIDER` + `LETTERCRAFT_MODEL`)
///    — both set means the provider was chosen at the execution-environment
///    level (shell script, CI). Checked before full auto-detection so the
///    model choice is honoured even when multiple API keys are present.
///
/// 4. **Full auto-detection** (`ProviderFactory::from_env`) — the factory
///    scans all known API key variables and picks the first available
///    provider.
fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, LettercraftError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("LETTERCRAFT_LLM_PROVIDER"),
        std::env::var("LETTERCRAFT_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| LettercraftError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {e}"
            ),
        })?;

    Ok(llm_provider)
}

/// Instantiate a named provider with the given model.
fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, LettercraftError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        LettercraftError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
