use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const FALLBACK_APPEARANCE: &str = "Beautiful girl with long brown hair and blue eyes";
pub const FALLBACK_PERSONALITY: &str = "Shy, smart, affectionate";
pub const FALLBACK_FIRST_MESSAGE: &str =
    "Hi there\u{2026} I hope we can get to know each other better \u{1f495}";

/// Structured description of a companion, as produced by the text model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub appearance: String,
    pub personality: String,
    pub first_message: String,
}

impl Persona {
    /// The persona used whenever the text model is unavailable or its
    /// answer cannot be parsed.
    pub fn fallback() -> Self {
        Self {
            appearance: FALLBACK_APPEARANCE.to_string(),
            personality: FALLBACK_PERSONALITY.to_string(),
            first_message: FALLBACK_FIRST_MESSAGE.to_string(),
        }
    }
}

/// A companion profile owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Companion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub appearance: String,
    pub personality: String,
    #[serde(default)]
    pub avatar_url: String,
    pub created_at: jiff::Timestamp,
}

impl Companion {
    pub fn new(user_id: Uuid, name: impl Into<String>, persona: &Persona, avatar_url: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            appearance: persona.appearance.clone(),
            personality: persona.personality.clone(),
            avatar_url,
            created_at: jiff::Timestamp::now(),
        }
    }
}
