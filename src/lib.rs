//! # lettercraft
//!
//! Generate branded HTML newsletters from PDF templates using LLMs.
//!
//! ## Why this crate?
//!
//! Organisations sit on piles of beautifully designed newsletter PDFs whose
//! content is stale. Asking a model to "write a newsletter that looks like
//! this PDF" produces broken layouts — models mangle long image URLs and
//! inline styles, and invent structure. Instead this crate converts the PDF
//! to HTML, swaps every text paragraph for a `{{ key }}` placeholder, strips
//! the fragile assets out before the document goes anywhere near a prompt,
//! lets the model fill only the placeholders (within per-slot character
//! budgets derived from the original text), and then reassembles the
//! document with its assets restored. The layout never transits the model,
//! so it cannot be mangled.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Convert    ConvertAPI PDF → HTML (stored file + download)
//!  ├─ 2. Decode     UTF-8, falling back to windows-1252
//!  ├─ 3. Extract    classify paragraphs, write {{ key }} tokens
//!  ├─ 4. Strip      capture image sources + inline styles, in order
//!  ├─ 5. Budget     per-key character limits (original length × 1.2)
//!  ├─ 6. Generate   one chat call → JSON key→text mapping
//!  └─ 7. Reassemble substitute, re-parse, restore assets positionally
//! ```
//!
//! There is also a no-template path ([`generate_from_prompt`]) that asks the
//! model for a complete styled document when no PDF is available.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lettercraft::{generate_from_template, Brief, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     // Conversion secret read from CONVERT_API_SECRET.
//!     let config = GenerationConfig::default();
//!     let brief = Brief::new("Spring Gala", "celebratory")
//!         .with_content("Doors open at 6pm. RSVP by Friday.");
//!     let pdf = std::fs::read("template.pdf")?;
//!     let output = generate_from_template(&pdf, "template.pdf", &brief, &config).await?;
//!     println!("{}", output.html);
//!     eprintln!("tokens: {} in / {} out",
//!         output.stats.input_tokens,
//!         output.stats.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `lettercraft` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! lettercraft = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Brief, GenerationConfig, GenerationConfigBuilder, OUTPUT_FILENAME};
pub use error::{LettercraftError, PipelineWarning};
pub use generate::{
    generate_from_prompt, generate_from_prompt_to_file, generate_from_template,
    generate_from_template_sync, generate_from_template_to_file,
};
pub use output::{GenerationStats, PlaceholderReport, ScratchOutput, TemplateOutput};
pub use pipeline::extract::{ClassMap, SlotType};
