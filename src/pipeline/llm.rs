//! Content generation: one chat call, one parsed key→text mapping.
//!
//! This module is intentionally thin — all prompt engineering lives in
//! [`crate::prompts`] so it can change without touching call or parsing
//! logic here.
//!
//! ## Reply parsing
//!
//! Models routinely wrap the requested JSON object in prose ("Sure! Here you
//! go: {…} Thanks."). Rather than demand a perfectly bare reply, we take the
//! substring from the first `{` to the last `}` and parse that. A reply with
//! no such pair, or whose substring is not a JSON object, is a fatal
//! [`LettercraftError::MalformedReply`] — there is no retry at this layer;
//! retry policy belongs to the orchestrator if anywhere.
//!
//! ## Budget enforcement
//!
//! Values are measured in characters, not bytes: budgets came from
//! character counts of the original text and the substitution target is
//! human-visible text. Over-budget values are cut to `budget − 3` characters
//! with a `"..."` suffix so the final value is exactly at budget.

use crate::config::{Brief, GenerationConfig};
use crate::error::LettercraftError;
use crate::pipeline::budget::BudgetMap;
use crate::prompts::{content_prompt, CONTENT_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// One completed chat exchange, reduced to what the pipeline needs.
#[derive(Debug, Clone)]
pub struct LlmReply {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Generated slot values plus bookkeeping about what had to be cut.
#[derive(Debug, Clone)]
pub struct GeneratedContent {
    /// Key → final (possibly truncated) text, in budget-map order.
    pub values: IndexMap<String, String>,
    /// Keys whose values exceeded their budget and were truncated.
    pub truncated: Vec<String>,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Issue one chat call with the configured timeout.
pub async fn chat_once(
    provider: &Arc<dyn LLMProvider>,
    messages: &[ChatMessage],
    config: &GenerationConfig,
) -> Result<LlmReply, LettercraftError> {
    let options = CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    };

    let call = provider.chat(messages, Some(&options));
    let response = timeout(Duration::from_secs(config.api_timeout_secs), call)
        .await
        .map_err(|_| LettercraftError::LlmTimeout {
            secs: config.api_timeout_secs,
        })?
        .map_err(|e| LettercraftError::LlmApiError {
            message: format!("{e}"),
        })?;

    debug!(
        input_tokens = response.prompt_tokens,
        output_tokens = response.completion_tokens,
        "chat call completed"
    );

    Ok(LlmReply {
        content: response.content,
        input_tokens: response.prompt_tokens,
        output_tokens: response.completion_tokens,
    })
}

/// Run the template path's single content call and parse the reply.
pub async fn generate_content(
    provider: &Arc<dyn LLMProvider>,
    brief: &Brief,
    budgets: &BudgetMap,
    config: &GenerationConfig,
) -> Result<GeneratedContent, LettercraftError> {
    let messages = vec![
        ChatMessage::system(CONTENT_SYSTEM_PROMPT),
        ChatMessage::user(content_prompt(brief, budgets)),
    ];

    let reply = chat_once(provider, &messages, config).await?;
    let raw = parse_mapping(&reply.content)?;
    let (values, truncated) = enforce_budgets(&raw, budgets);

    if !truncated.is_empty() {
        warn!(keys = ?truncated, "generated values exceeded their budgets; truncated");
    }

    Ok(GeneratedContent {
        values,
        truncated,
        input_tokens: reply.input_tokens,
        output_tokens: reply.output_tokens,
    })
}

/// Extract the key→string mapping from a model reply.
///
/// Takes the substring from the first `{` to the last `}` (inclusive) and
/// parses it as a JSON object. Non-string values are ignored — they count as
/// "no replacement" for their key, like a missing key.
pub fn parse_mapping(reply: &str) -> Result<IndexMap<String, String>, LettercraftError> {
    let start = reply.find('{').ok_or_else(|| LettercraftError::MalformedReply {
        detail: "no '{' in reply".to_string(),
    })?;
    let end = reply.rfind('}').ok_or_else(|| LettercraftError::MalformedReply {
        detail: "no '}' in reply".to_string(),
    })?;
    if end < start {
        return Err(LettercraftError::MalformedReply {
            detail: "'}' precedes '{'".to_string(),
        });
    }

    let object: serde_json::Value = serde_json::from_str(&reply[start..=end]).map_err(|e| {
        LettercraftError::MalformedReply {
            detail: format!("not valid JSON: {e}"),
        }
    })?;

    let Some(entries) = object.as_object() else {
        return Err(LettercraftError::MalformedReply {
            detail: "reply JSON is not an object".to_string(),
        });
    };

    let mut mapping = IndexMap::new();
    for (key, value) in entries {
        if let Some(text) = value.as_str() {
            mapping.insert(key.clone(), text.to_string());
        }
    }
    Ok(mapping)
}

/// Apply budgets to the parsed values.
///
/// Iterates in budget-map (document) order, so output order is stable. Keys
/// present in the reply but absent from the budget map are dropped; keys
/// absent from the reply stay absent.
pub fn enforce_budgets(
    raw: &IndexMap<String, String>,
    budgets: &BudgetMap,
) -> (IndexMap<String, String>, Vec<String>) {
    let mut values = IndexMap::new();
    let mut truncated = Vec::new();

    for (key, &budget) in budgets {
        if let Some(value) = raw.get(key) {
            if value.chars().count() > budget {
                values.insert(key.clone(), truncate_with_ellipsis(value, budget));
                truncated.push(key.clone());
            } else {
                values.insert(key.clone(), value.clone());
            }
        }
    }

    (values, truncated)
}

/// Cut `value` to `budget − 3` characters and append `"..."`.
fn truncate_with_ellipsis(value: &str, budget: usize) -> String {
    let kept: String = value.chars().take(budget.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Budget-map keys that received no value.
pub fn missing_keys(values: &IndexMap<String, String>, budgets: &BudgetMap) -> Vec<String> {
    budgets
        .keys()
        .filter(|key| !values.contains_key(*key))
        .cloned()
        .collect()
}
