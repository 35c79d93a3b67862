//! RunPod serverless endpoints, used for image edits.

use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info};

use eva_core::config::{ApiKey, RunPodSettings};
use eva_core::models::media::MediaKind;

use crate::client::{send_json, str_at};
use crate::error::ProviderError;
use crate::media::{BoxFuture, JobHandle, JobRequest, JobStatus, MediaProvider, ready_status};

const NAME: &str = "runpod";

pub struct RunPodProvider {
    client: Client,
    api_key: ApiKey,
    settings: RunPodSettings,
}

impl RunPodProvider {
    pub fn new(client: Client, api_key: ApiKey, settings: RunPodSettings) -> Self {
        Self {
            client,
            api_key,
            settings,
        }
    }

    fn key(&self) -> Result<&str, ProviderError> {
        self.api_key.get().ok_or(ProviderError::MissingCredential(NAME))
    }

    fn endpoint_url(&self, tail: &str) -> String {
        format!(
            "{}/v2/{}/{tail}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.edit_endpoint
        )
    }

    async fn run(&self, request: &JobRequest) -> Result<JobHandle, ProviderError> {
        let key = self.key()?;
        let source = match (request.kind, request.source_media_url.as_deref()) {
            (MediaKind::Image, Some(source)) => source,
            (MediaKind::Image, None) => {
                return Err(ProviderError::Unsupported {
                    provider: NAME,
                    what: "images without a source image".to_string(),
                });
            }
            (MediaKind::Video, _) => {
                return Err(ProviderError::Unsupported {
                    provider: NAME,
                    what: "videos".to_string(),
                });
            }
        };

        let body = json!({
            "input": {
                "prompt": request.prompt,
                "images": [source],
                "size": self.settings.size,
                "enable_safety_checker": false,
            }
        });

        info!(provider = NAME, endpoint = %self.settings.edit_endpoint, "submitting job");

        let response = send_json(
            self.client
                .post(self.endpoint_url("run"))
                .bearer_auth(key)
                .json(&body),
        )
        .await?;

        let job_id = str_at(&response, "/id")
            .ok_or_else(|| ProviderError::ResponseParse(format!("no id in response: {response}")))?;

        info!(provider = NAME, job_id, "job submitted");

        Ok(JobHandle {
            provider: NAME,
            kind: request.kind,
            job_id: job_id.to_string(),
            ready_url: None,
        })
    }

    async fn status(&self, handle: &JobHandle) -> Result<JobStatus, ProviderError> {
        let key = self.key()?;
        let response = send_json(
            self.client
                .get(self.endpoint_url(&format!("status/{}", handle.job_id)))
                .bearer_auth(key),
        )
        .await?;

        Ok(parse_status(&response))
    }
}

/// Map a `/status/{id}` response onto a [`JobStatus`].
pub fn parse_status(response: &Value) -> JobStatus {
    let status = str_at(response, "/status").unwrap_or("IN_QUEUE");
    debug!(provider = NAME, status, "job status");

    match status {
        "COMPLETED" => match str_at(response, "/output/result") {
            Some(url) => JobStatus::Succeeded(url.to_string()),
            None => JobStatus::Failed("completed without output.result".to_string()),
        },
        "FAILED" | "CANCELLED" | "TIMED_OUT" => {
            let reason = str_at(response, "/error").unwrap_or(status);
            JobStatus::Failed(reason.to_string())
        }
        _ => JobStatus::Pending,
    }
}

impl MediaProvider for RunPodProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn submit<'a>(
        &'a self,
        request: &'a JobRequest,
    ) -> BoxFuture<'a, Result<JobHandle, ProviderError>> {
        Box::pin(self.run(request))
    }

    fn poll<'a>(&'a self, handle: &'a JobHandle) -> BoxFuture<'a, Result<JobStatus, ProviderError>> {
        Box::pin(async move {
            if let Some(status) = ready_status(handle) {
                return Ok(status);
            }
            self.status(handle).await
        })
    }
}
