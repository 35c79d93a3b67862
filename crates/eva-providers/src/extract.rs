//! Structured output extraction from free-form model answers.
//!
//! Text models are asked for a bare JSON object but frequently wrap it in a
//! Markdown fence or surround it with prose. [`extract_json_block`] digs the
//! object out and [`parse_persona`] decodes it.

use serde::Deserialize;

use eva_core::models::companion::{FALLBACK_FIRST_MESSAGE, FALLBACK_PERSONALITY, Persona};

use crate::error::ProviderError;

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Locate the JSON object inside a model answer.
///
/// A ```` ```json ```` fenced block wins. Otherwise the span from the first
/// `{` to the last `}` is returned. `None` when neither is present.
pub fn extract_json_block(text: &str) -> Option<&str> {
    if let Some(start) = text.find(FENCE_OPEN) {
        let body = &text[start + FENCE_OPEN.len()..];
        if let Some(end) = body.find(FENCE_CLOSE) {
            let block = body[..end].trim();
            if !block.is_empty() {
                return Some(block);
            }
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPersona {
    appearance: Option<String>,
    personality: Option<Traits>,
    first_message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Traits {
    One(String),
    Many(Vec<String>),
}

impl Traits {
    fn joined(self) -> String {
        match self {
            Self::One(s) => s,
            Self::Many(items) => items.join(", "),
        }
    }
}

/// Decode a persona from a model answer.
///
/// `appearance` is required. A missing `personality` or `firstMessage`
/// takes the fallback value. `personality` may be a string or a list of
/// traits, which are joined with `", "`.
pub fn parse_persona(text: &str) -> Result<Persona, ProviderError> {
    let block = extract_json_block(text)
        .ok_or_else(|| ProviderError::ResponseParse("no JSON object in answer".to_string()))?;

    let raw: RawPersona = serde_json::from_str(block)
        .map_err(|e| ProviderError::ResponseParse(format!("invalid persona JSON: {e}")))?;

    let appearance = raw
        .appearance
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::ResponseParse("persona has no appearance".to_string()))?;

    let personality = raw
        .personality
        .map(Traits::joined)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_PERSONALITY.to_string());

    let first_message = raw
        .first_message
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_FIRST_MESSAGE.to_string());

    Ok(Persona {
        appearance,
        personality,
        first_message,
    })
}
