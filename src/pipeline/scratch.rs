//! Newsletter generation without a template.
//!
//! Two chat calls: the first rewrites the user's raw prompt into polished
//! newsletter prose, the second asks for a complete styled HTML document
//! built around that prose. The only acceptance check on the layout reply is
//! the presence of an embedded `<style>` block — an unstyled fragment is a
//! failed attempt, and the layout call is retried with a fresh sample up to
//! a configured cap before giving up with
//! [`LettercraftError::StyleRetriesExhausted`].

use crate::config::{Brief, GenerationConfig};
use crate::error::LettercraftError;
use crate::pipeline::llm::chat_once;
use crate::prompts::{layout_prompt, polish_prompt};
use edgequake_llm::{ChatMessage, LLMProvider};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of the no-template path, before any file is written.
#[derive(Debug, Clone)]
pub struct ScratchDocument {
    pub html: String,
    /// Layout attempts used (1 means the first reply was styled).
    pub attempts: u32,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Remove a leading/trailing markdown code fence if the model added one.
///
/// Handles ```` ```html ```` and bare ```` ``` ```` fences; anything else is
/// returned unchanged.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```html")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Whether `html` carries an embedded stylesheet.
///
/// Case-insensitive; an opening tag with attributes (`<style type=…>`)
/// counts. Both the opening and closing tag must be present, so a reply
/// truncated mid-stylesheet is rejected too.
pub fn has_style_block(html: &str) -> bool {
    let lower = html.to_lowercase();
    lower.contains("<style") && lower.contains("</style>")
}

/// Polish the brief, then generate a styled HTML document.
pub async fn generate_document(
    provider: &Arc<dyn LLMProvider>,
    brief: &Brief,
    config: &GenerationConfig,
) -> Result<ScratchDocument, LettercraftError> {
    let mut input_tokens = 0;
    let mut output_tokens = 0;

    info!("polishing user prompt");
    let polish = chat_once(
        provider,
        &[ChatMessage::user(polish_prompt(&brief.content, &brief.topic))],
        config,
    )
    .await?;
    input_tokens += polish.input_tokens;
    output_tokens += polish.output_tokens;
    let polished = polish.content.trim().to_string();
    debug!(chars = polished.chars().count(), "prompt polished");

    let layout_messages = [ChatMessage::user(layout_prompt(&polished, &brief.tone))];
    for attempt in 1..=config.max_style_retries {
        info!(attempt, max = config.max_style_retries, "requesting layout");
        let reply = chat_once(provider, &layout_messages, config).await?;
        input_tokens += reply.input_tokens;
        output_tokens += reply.output_tokens;

        let html = strip_code_fences(&reply.content);
        if has_style_block(html) {
            return Ok(ScratchDocument {
                html: html.to_string(),
                attempts: attempt,
                input_tokens,
                output_tokens,
            });
        }
        warn!(attempt, "layout reply had no <style> block; retrying");
    }

    Err(LettercraftError::StyleRetriesExhausted {
        attempts: config.max_style_retries,
    })
}
