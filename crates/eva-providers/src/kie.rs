//! Kie.ai job API.
//!
//! Jobs are created with `POST /api/v1/jobs/createTask` and observed with
//! `GET /api/v1/jobs/recordInfo?taskId=…`. Every response is wrapped in a
//! `{code, msg, data}` envelope where `code` mirrors the HTTP status.
//! Finished jobs carry their output in `data.resultJson`, a JSON document
//! encoded as a string.

use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use eva_core::config::{ApiKey, KieSettings};
use eva_core::models::media::MediaKind;

use crate::client::{send_json, str_at};
use crate::error::ProviderError;
use crate::media::{BoxFuture, JobHandle, JobRequest, JobStatus, MediaProvider, ready_status};

const NAME: &str = "kie";

pub struct KieProvider {
    client: Client,
    api_key: ApiKey,
    settings: KieSettings,
}

impl KieProvider {
    pub fn new(client: Client, api_key: ApiKey, settings: KieSettings) -> Self {
        Self {
            client,
            api_key,
            settings,
        }
    }

    fn key(&self) -> Result<&str, ProviderError> {
        self.api_key.get().ok_or(ProviderError::MissingCredential(NAME))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.settings.base_url.trim_end_matches('/'))
    }

    /// Request body for `createTask`.
    ///
    /// The video model expects its `input` as a JSON-encoded string rather
    /// than an object.
    pub fn task_body(&self, request: &JobRequest) -> Result<Value, ProviderError> {
        match request.kind {
            MediaKind::Image => {
                if request.source_media_url.is_some() {
                    return Err(ProviderError::Unsupported {
                        provider: NAME,
                        what: "image edits".to_string(),
                    });
                }
                Ok(json!({
                    "model": self.settings.image_model,
                    "input": {
                        "prompt": request.prompt,
                        "aspect_ratio": self.settings.aspect_ratio,
                    },
                }))
            }
            MediaKind::Video => {
                let source = request.source_media_url.as_deref().ok_or_else(|| {
                    ProviderError::Unsupported {
                        provider: NAME,
                        what: "video without a source image".to_string(),
                    }
                })?;
                let input = json!({
                    "duration": self.settings.video_duration,
                    "image_urls": [source],
                    "multi_shots": self.settings.multi_shots,
                    "prompt": request.prompt,
                    "resolution": self.settings.video_resolution,
                });
                Ok(json!({
                    "model": self.settings.video_model,
                    "input": input.to_string(),
                }))
            }
        }
    }

    async fn create_task(&self, request: &JobRequest) -> Result<JobHandle, ProviderError> {
        let key = self.key()?;
        let body = self.task_body(request)?;

        info!(provider = NAME, kind = %request.kind, "creating task");

        let response = send_json(
            self.client
                .post(self.url("/api/v1/jobs/createTask"))
                .bearer_auth(key)
                .json(&body),
        )
        .await?;
        check_envelope(&response)?;

        let job_id = str_at(&response, "/data/recordId")
            .or_else(|| str_at(&response, "/data/taskId"))
            .ok_or_else(|| {
                ProviderError::ResponseParse(format!("no recordId or taskId in response: {response}"))
            })?;

        info!(provider = NAME, job_id, "task created");

        Ok(JobHandle {
            provider: NAME,
            kind: request.kind,
            job_id: job_id.to_string(),
            ready_url: None,
        })
    }

    async fn record_info(&self, handle: &JobHandle) -> Result<JobStatus, ProviderError> {
        let key = self.key()?;
        let response = send_json(
            self.client
                .get(self.url("/api/v1/jobs/recordInfo"))
                .query(&[("taskId", handle.job_id.as_str())])
                .bearer_auth(key),
        )
        .await?;
        check_envelope(&response)?;

        let state = str_at(&response, "/data/state").unwrap_or("pending");
        debug!(provider = NAME, job_id = %handle.job_id, state, "task state");

        match state {
            "success" => match response.pointer("/data/resultJson").and_then(first_result_url) {
                Some(url) => Ok(JobStatus::Succeeded(url)),
                None => {
                    warn!(provider = NAME, job_id = %handle.job_id, "success without result url");
                    Ok(JobStatus::Failed("no result url in resultJson".to_string()))
                }
            },
            "fail" | "failed" => {
                let reason = str_at(&response, "/data/failMsg").unwrap_or(state);
                Ok(JobStatus::Failed(reason.to_string()))
            }
            _ => Ok(JobStatus::Pending),
        }
    }
}

impl MediaProvider for KieProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn submit<'a>(
        &'a self,
        request: &'a JobRequest,
    ) -> BoxFuture<'a, Result<JobHandle, ProviderError>> {
        Box::pin(self.create_task(request))
    }

    fn poll<'a>(&'a self, handle: &'a JobHandle) -> BoxFuture<'a, Result<JobStatus, ProviderError>> {
        Box::pin(async move {
            if let Some(status) = ready_status(handle) {
                return Ok(status);
            }
            self.record_info(handle).await
        })
    }
}

fn check_envelope(response: &Value) -> Result<(), ProviderError> {
    if let Some(code) = response.get("code").and_then(Value::as_i64)
        && code != 200
    {
        let msg = str_at(response, "/msg").unwrap_or("unknown error");
        return Err(ProviderError::Rejected(format!("code={code} msg={msg}")));
    }
    Ok(())
}

/// First entry of `resultUrls` in a `resultJson` value.
///
/// The field is normally a JSON-encoded string, but an inline object is
/// accepted too.
pub fn first_result_url(result_json: &Value) -> Option<String> {
    let parsed;
    let result = match result_json {
        Value::String(raw) => {
            parsed = serde_json::from_str::<Value>(raw).ok()?;
            &parsed
        }
        other => other,
    };
    result
        .get("resultUrls")?
        .as_array()?
        .first()?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
