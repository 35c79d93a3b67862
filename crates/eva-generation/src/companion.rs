//! Companion creation.
//!
//! The text model invents a persona, the image provider paints an avatar
//! of it, and the result is saved for the user. Persona problems never fail
//! the request: the fixed fallback persona takes over.

use rand::seq::SliceRandom;
use tracing::{info, warn};
use uuid::Uuid;

use eva_core::models::companion::{Companion, Persona};
use eva_ledger::error::LedgerError;
use eva_providers::extract::parse_persona;

use crate::error::GenerationError;
use crate::orchestrator::{Billing, Orchestrator};

const DEFAULT_NAME: &str = "Eva";

/// A freshly created companion and the message she opens with.
#[derive(Debug, Clone)]
pub struct CreatedCompanion {
    pub companion: Companion,
    pub first_message: String,
}

impl Orchestrator {
    /// Create and save a companion for `user_id`.
    ///
    /// Fails only when the user does not exist or the companion cannot be
    /// saved. The avatar is generated free of charge and left empty if
    /// generation fails.
    pub async fn create_companion(&self, user_id: Uuid) -> Result<CreatedCompanion, GenerationError> {
        let store = self.ledger().store().clone();
        if store.find_user(user_id).await?.is_none() {
            return Err(LedgerError::UserNotFound(user_id).into());
        }

        let persona = self.invent_persona().await;
        let name = pick_name(&self.prompts.names);

        let avatar_prompt = format!("{}, {}", persona.appearance, self.prompts.avatar_suffix);
        let avatar = self
            .generate_image(&avatar_prompt, None, Billing::Waived)
            .await?;
        if avatar.is_empty() {
            warn!(user_id = %user_id, "avatar generation produced nothing");
        }

        let companion = Companion::new(user_id, name, &persona, avatar.url);
        store.save_companion(&companion).await?;

        info!(
            user_id = %user_id,
            companion_id = %companion.id,
            name = %companion.name,
            has_avatar = !companion.avatar_url.is_empty(),
            "companion created"
        );

        Ok(CreatedCompanion {
            companion,
            first_message: persona.first_message,
        })
    }

    async fn invent_persona(&self) -> Persona {
        let answer = match self.providers().text.complete(&self.prompts.persona).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "persona request failed, using fallback");
                return Persona::fallback();
            }
        };

        match parse_persona(&answer) {
            Ok(persona) => persona,
            Err(e) => {
                warn!(error = %e, "persona answer unusable, using fallback");
                Persona::fallback()
            }
        }
    }
}

fn pick_name(names: &[String]) -> String {
    names
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_else(|| DEFAULT_NAME.to_string())
}
