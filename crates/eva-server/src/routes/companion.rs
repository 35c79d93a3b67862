use axum::extract::{Extension, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionResponse {
    pub id: Uuid,
    pub name: String,
    pub appearance: String,
    pub personality: String,
    pub first_message: String,
    pub avatar_url: String,
}

pub async fn create_girl(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CompanionResponse>, ApiError> {
    let created = state.orchestrator.create_companion(user.user_id).await?;
    let companion = created.companion;

    Ok(Json(CompanionResponse {
        id: companion.id,
        name: companion.name,
        appearance: companion.appearance,
        personality: companion.personality,
        first_message: created.first_message,
        avatar_url: companion.avatar_url,
    }))
}
