//! fal.ai synchronous model endpoints.
//!
//! `POST {base}/{model}` blocks until the model finishes and answers with
//! the artifact, so a submitted job is already complete.

use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

use eva_core::config::{ApiKey, FalSettings};
use eva_core::models::media::MediaKind;

use crate::client::{send_json, str_at};
use crate::error::ProviderError;
use crate::media::{BoxFuture, JobHandle, JobRequest, JobStatus, MediaProvider, ready_status};

const NAME: &str = "fal";

pub struct FalProvider {
    client: Client,
    api_key: ApiKey,
    settings: FalSettings,
}

impl FalProvider {
    pub fn new(client: Client, api_key: ApiKey, settings: FalSettings) -> Self {
        Self {
            client,
            api_key,
            settings,
        }
    }

    fn model_for(&self, request: &JobRequest) -> &str {
        match (request.kind, &request.source_media_url) {
            (MediaKind::Image, None) => &self.settings.image_model,
            (MediaKind::Image, Some(_)) => &self.settings.edit_model,
            (MediaKind::Video, _) => &self.settings.video_model,
        }
    }

    async fn invoke(&self, request: &JobRequest) -> Result<JobHandle, ProviderError> {
        let key = self.api_key.get().ok_or(ProviderError::MissingCredential(NAME))?;

        if request.kind == MediaKind::Video && request.source_media_url.is_none() {
            return Err(ProviderError::Unsupported {
                provider: NAME,
                what: "video without a source image".to_string(),
            });
        }

        let model = self.model_for(request);
        let mut body = json!({ "prompt": request.prompt });
        if let Some(source) = &request.source_media_url {
            body["image_url"] = Value::String(source.clone());
        }

        info!(provider = NAME, model, kind = %request.kind, "invoking model");

        let response = send_json(
            self.client
                .post(format!("{}/{model}", self.settings.base_url.trim_end_matches('/')))
                .header("Authorization", format!("Key {key}"))
                .json(&body),
        )
        .await?;

        let url = result_url(request.kind, &response).ok_or_else(|| {
            ProviderError::ResponseParse(format!("no {} url in response: {response}", request.kind))
        })?;
        let job_id = str_at(&response, "/request_id").unwrap_or(model);

        info!(provider = NAME, model, "model returned artifact");

        Ok(JobHandle {
            provider: NAME,
            kind: request.kind,
            job_id: job_id.to_string(),
            ready_url: Some(url.to_string()),
        })
    }
}

/// `images[0].url` for images, `video.url` for videos.
pub fn result_url(kind: MediaKind, response: &Value) -> Option<&str> {
    match kind {
        MediaKind::Image => str_at(response, "/images/0/url"),
        MediaKind::Video => str_at(response, "/video/url"),
    }
}

impl MediaProvider for FalProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn submit<'a>(
        &'a self,
        request: &'a JobRequest,
    ) -> BoxFuture<'a, Result<JobHandle, ProviderError>> {
        Box::pin(self.invoke(request))
    }

    fn poll<'a>(&'a self, handle: &'a JobHandle) -> BoxFuture<'a, Result<JobStatus, ProviderError>> {
        Box::pin(async move {
            Ok(ready_status(handle)
                .unwrap_or_else(|| JobStatus::Failed("synchronous job has no artifact".to_string())))
        })
    }
}
