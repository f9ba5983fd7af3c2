//! LLM prompts for both generation paths.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the brief, the reply contract, or
//!    the layout rules means editing exactly one place.
//!
//! 2. **Testability** — unit tests inspect the built prompts directly without
//!    spinning up a model, so contract regressions (a dropped key, a missing
//!    budget) are caught cheaply.

use crate::config::Brief;
use crate::pipeline::budget::BudgetMap;

/// System prompt for the template path's single content call.
pub const CONTENT_SYSTEM_PROMPT: &str = "You are a professional newsletter copywriter. \
You write compelling, well-structured internal company newsletter copy and you follow \
output-format instructions exactly.";

/// Build the one content-generation instruction for the template path.
///
/// The reply contract matters more than the copywriting flourishes: the model
/// must return a single JSON object keyed exactly by the placeholder keys,
/// each value within its character budget, with no repetition across keys.
/// Everything downstream (reply parsing, truncation, reassembly) assumes
/// this shape.
pub fn content_prompt(brief: &Brief, budgets: &BudgetMap) -> String {
    let mut slots = String::new();
    for (key, budget) in budgets {
        slots.push_str(&format!("- \"{key}\": at most {budget} characters\n"));
    }

    let source = if brief.content.trim().is_empty() {
        "(No source material provided. Write based solely on the topic.)".to_string()
    } else {
        brief.content.clone()
    };

    format!(
        "Write copy for an internal company newsletter.\n\
         Tone: {tone}\n\
         Topic: {topic}\n\
         Source Material:\n{source}\n\
         \n\
         Ensure the content is original, factually grounded in the source material, and \
         engaging. Avoid fluff.\n\
         \n\
         Fill these placeholder slots, respecting each character limit strictly:\n\
         {slots}\
         \n\
         Reply with a single JSON object and nothing else. Its keys must be exactly the \
         slot names listed above and each value must be the text for that slot. Do not \
         repeat the same sentence or phrase across different slots. Do not add keys, \
         commentary, or markdown fences.",
        tone = brief.tone,
        topic = brief.topic,
        source = source,
        slots = slots,
    )
}

/// Build the polish instruction for the no-template path (stage one).
///
/// Rewrites the user's raw prompt into newsletter-register prose without
/// dropping any of their information.
pub fn polish_prompt(user_prompt: &str, topic: &str) -> String {
    format!(
        "You are an expert copywriter and HTML email designer. Take the user's raw prompt \
         containing newsletter content (company information, announcements, goals, etc.) \
         and rewrite it in a more professional, polished, newsletter-appropriate register. \
         Maintain the original intent, meaning, and key points; improve clarity, tone, and \
         grammar to match corporate communication standards. Do not remove any meaningful \
         user-provided information — only reword it.\n\
         User prompt: {user_prompt}\n\
         Topic: {topic}\n\
         RETURN ONLY THE REWRITTEN PROMPT. DO NOT SAY ANYTHING ELSE."
    )
}

/// Build the layout instruction for the no-template path (stage two).
///
/// Asks for a complete, self-contained HTML newsletter: one embedded
/// `<style>` block, a randomly chosen layout archetype, fixed approximate
/// dimensions, and placeholder imagery for missing visuals. The flow-layout
/// rules keep the result editable in drag-and-drop editors, which break on
/// absolutely-positioned sections.
pub fn layout_prompt(polished_content: &str, tone: &str) -> String {
    format!(
        "Create a professional HTML newsletter template, approximately 790px wide and \
         1250px tall.\n\
         Select one layout archetype at random: hero-first, card-style, stacked-content, \
         column-grid, sidebar-left, or sidebar-right.\n\
         Include: company branding (logo and name), a navigation bar with 3-5 items, a \
         hero section with headline, subtitle and call-to-action button, alternating \
         image-and-text content blocks, a quote or announcement section, an optional \
         sidebar if the archetype calls for one, and a footer with social icons and \
         legal text.\n\
         Generate a cohesive colour scheme and a serif/sans-serif font pairing, with \
         consistent spacing and a clean, professional appearance.\n\
         Structure every main section as a block-level element that stacks naturally in \
         the vertical document flow. Never use position: absolute on primary layout divs; \
         use display: flex or display: grid for internal arrangement and media queries \
         for responsive adjustments, so the design keeps its integrity when individual \
         elements are moved by an external editor.\n\
         Use div-based layout (no tables). Use placeholder images from \
         https://via.placeholder.com/ for any missing visuals.\n\
         Put all CSS in a single <style> tag. Do not emit <html>, <head>, or <body> \
         wrapper tags. Do not use Lorem Ipsum — write meaningful content or leave the \
         element empty.\n\
         Include this user-provided content: {polished_content}\n\
         Write it in this tone: {tone}\n\
         Output clean HTML code only, with no explanations or comments."
    )
}
