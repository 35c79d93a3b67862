use std::future::Future;
use std::time::Duration;

use axum::extract::{Extension, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use eva_core::models::media::{MediaKind, MediaResult};
use eva_generation::error::GenerationError;
use eva_generation::orchestrator::Billing;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub base_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFromImageRequest {
    pub image_url: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_image_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub video_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_video_url: Option<String>,
}

impl From<MediaResult> for ImageResponse {
    fn from(r: MediaResult) -> Self {
        Self {
            image_url: r.url,
            original_image_url: r.original_url,
        }
    }
}

impl From<MediaResult> for VideoResponse {
    fn from(r: MediaResult) -> Self {
        Self {
            video_url: r.url,
            original_video_url: r.original_url,
        }
    }
}

/// Run a generation under the request deadline for `kind`.
///
/// Hitting the deadline drops the generation future, which stops polling.
/// A debit that already happened stands.
pub async fn with_deadline<F>(deadline: Duration, fut: F) -> Result<MediaResult, ApiError>
where
    F: Future<Output = Result<MediaResult, GenerationError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => {
            tracing::warn!(deadline_secs = deadline.as_secs(), "generation deadline exceeded");
            Err(ApiError::Timeout("generation did not finish in time".to_string()))
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

pub async fn generate_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<ImageResponse>, ApiError> {
    require("prompt", &body.prompt)?;

    let result = with_deadline(
        state.config.polling.deadline(MediaKind::Image),
        state.orchestrator.generate_image(
            &body.prompt,
            body.base_image_url.as_deref(),
            Billing::Charge(user.user_id),
        ),
    )
    .await?;

    Ok(Json(result.into()))
}

pub async fn generate_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<VideoResponse>, ApiError> {
    require("prompt", &body.prompt)?;

    let result = with_deadline(
        state.config.polling.deadline(MediaKind::Video),
        state.orchestrator.generate_video(
            &body.prompt,
            body.base_image_url.as_deref(),
            Billing::Charge(user.user_id),
        ),
    )
    .await?;

    Ok(Json(result.into()))
}

pub async fn generate_video_from_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<VideoFromImageRequest>,
) -> Result<Json<VideoResponse>, ApiError> {
    require("imageUrl", &body.image_url)?;
    require("text", &body.text)?;

    let result = with_deadline(
        state.config.polling.deadline(MediaKind::Video),
        state.orchestrator.generate_video_from_image(
            &body.image_url,
            &body.text,
            Billing::Charge(user.user_id),
        ),
    )
    .await?;

    Ok(Json(result.into()))
}
