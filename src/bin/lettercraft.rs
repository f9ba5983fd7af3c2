//! CLI binary for lettercraft.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GenerationConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use lettercraft::{
    generate_from_prompt_to_file, generate_from_template_to_file, Brief, GenerationConfig,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate from a PDF template
  lettercraft template.pdf --topic "Spring Gala" --tone celebratory

  # With source material from a file
  lettercraft template.pdf --topic "Q3 results" --content-file notes.txt

  # No template: ask the model for a complete styled document
  lettercraft --topic "Team offsite recap" --content "We hiked, we planned, we ate."

  # Use a specific model
  lettercraft template.pdf --topic "Launch" --model gpt-4.1 --provider openai

  # JSON report (placeholders, warnings, stats) on stdout
  lettercraft template.pdf --topic "Launch" --json > report.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY            OpenAI API key
  ANTHROPIC_API_KEY         Anthropic API key
  GEMINI_API_KEY            Google Gemini API key
  LETTERCRAFT_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  LETTERCRAFT_MODEL         Override model ID
  CONVERT_API_SECRET        ConvertAPI bearer secret (template path only)

SETUP:
  1. Set API keys:    export OPENAI_API_KEY=sk-...
                      export CONVERT_API_SECRET=...
  2. Generate:        lettercraft template.pdf --topic "Spring Gala"

  The finished document is written to <output-dir>/<job-id>/newsletter.html.
"#;

/// Generate branded HTML newsletters from PDF templates using LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "lettercraft",
    version,
    about = "Generate branded HTML newsletters from PDF templates using LLMs",
    long_about = "Generate HTML newsletters. With a PDF template, the layout is preserved \
exactly — only the text placeholders are filled by the model. Without one, the model \
designs a complete styled document from your brief. Supports OpenAI, Anthropic, Google \
Gemini, and any OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF template file. Omit to generate without a template.
    template: Option<PathBuf>,

    /// Newsletter topic.
    #[arg(long, env = "LETTERCRAFT_TOPIC")]
    topic: String,

    /// Desired tone (informative, celebratory, formal, ...).
    #[arg(long, env = "LETTERCRAFT_TONE", default_value = "informative")]
    tone: String,

    /// Source material the copy should draw from.
    #[arg(long, conflicts_with = "content_file")]
    content: Option<String>,

    /// Read source material from this file instead of --content.
    #[arg(long)]
    content_file: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "LETTERCRAFT_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "LETTERCRAFT_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Directory for per-job output directories.
    #[arg(short, long, env = "LETTERCRAFT_OUTPUT_DIR", default_value = "generated")]
    output_dir: PathBuf,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "LETTERCRAFT_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "LETTERCRAFT_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Layout attempts before giving up when replies lack a <style> block.
    #[arg(long, env = "LETTERCRAFT_STYLE_RETRIES", default_value_t = 4)]
    style_retries: u32,

    /// Conversion-service HTTP timeout in seconds.
    #[arg(long, env = "LETTERCRAFT_CONVERT_TIMEOUT", default_value_t = 120)]
    convert_timeout: u64,

    /// Per-LLM-call timeout in seconds.
    #[arg(long, env = "LETTERCRAFT_API_TIMEOUT", default_value_t = 90)]
    api_timeout: u64,

    /// Output a structured JSON report instead of a summary.
    #[arg(long, env = "LETTERCRAFT_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "LETTERCRAFT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "LETTERCRAFT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build brief + config ─────────────────────────────────────────────
    let content = match (&cli.content, &cli.content_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read content from {path:?}"))?,
        (None, None) => String::new(),
    };
    let brief = Brief::new(&cli.topic, &cli.tone).with_content(content);

    let mut config = GenerationConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_style_retries(cli.style_retries)
        .convert_timeout_secs(cli.convert_timeout)
        .api_timeout_secs(cli.api_timeout)
        .output_dir(&cli.output_dir)
        .build()
        .context("Invalid configuration")?;
    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();

    // ── Run generation ───────────────────────────────────────────────────
    if let Some(ref template) = cli.template {
        let pdf_bytes = tokio::fs::read(template)
            .await
            .with_context(|| format!("Failed to read template {template:?}"))?;
        let filename = template
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "template.pdf".to_string());

        let output = generate_from_template_to_file(&pdf_bytes, &filename, &brief, &config)
            .await
            .context("Generation failed")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(json.as_bytes()).context("Failed to write to stdout")?;
            handle.write_all(b"\n").ok();
        } else if !cli.quiet {
            let path = config.job_output_path(&output.job_id);
            eprintln!(
                "{}  {} placeholders filled  {}ms  →  {}",
                if output.warnings.is_empty() {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                output.stats.placeholder_count - output.stats.missing_keys,
                output.stats.total_ms,
                bold(&path.display().to_string()),
            );
            for warning in &output.warnings {
                eprintln!("   {} {warning}", cyan("⚠"));
            }
            eprintln!(
                "   {} tokens in  /  {} tokens out",
                dim(&output.stats.input_tokens.to_string()),
                dim(&output.stats.output_tokens.to_string()),
            );
        }
    } else {
        let output = generate_from_prompt_to_file(&brief, &config)
            .await
            .context("Generation failed")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            println!("{json}");
        } else if !cli.quiet {
            let path = config.job_output_path(&output.job_id);
            eprintln!(
                "{}  styled document on attempt {}  {}ms  →  {}",
                green("✔"),
                output.attempts,
                output.llm_ms,
                bold(&path.display().to_string()),
            );
            eprintln!(
                "   {} tokens in  /  {} tokens out",
                dim(&output.input_tokens.to_string()),
                dim(&output.output_tokens.to_string()),
            );
        }
    }

    Ok(())
}
