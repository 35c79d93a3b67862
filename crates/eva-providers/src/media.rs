//! The contract every media generation provider implements.
//!
//! Providers differ in how a job is created and observed: some answer
//! synchronously with the finished artifact, others hand back a job id that
//! has to be polled. Both shapes are normalized into [`JobHandle`] and
//! [`JobStatus`] so the poller never sees a provider-specific payload.

use std::future::Future;
use std::pin::Pin;

use eva_core::models::media::MediaKind;

use crate::error::ProviderError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub kind: MediaKind,
    pub prompt: String,
    /// Image to edit or animate. Must be fetchable by the provider.
    pub source_media_url: Option<String>,
}

impl JobRequest {
    pub fn new(kind: MediaKind, prompt: impl Into<String>) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
            source_media_url: None,
        }
    }

    pub fn with_source(mut self, url: impl Into<String>) -> Self {
        self.source_media_url = Some(url.into());
        self
    }
}

/// A job accepted by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub provider: &'static str,
    pub kind: MediaKind,
    pub job_id: String,
    /// Set when the provider answered synchronously; no polling needed.
    pub ready_url: Option<String>,
}

/// Provider-reported state of a job at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Succeeded(String),
    Failed(String),
}

/// An external compute service that turns a prompt into media.
pub trait MediaProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Create a job. Fails with `MissingCredential` before any network call
    /// when the provider has no API key.
    fn submit<'a>(&'a self, request: &'a JobRequest)
    -> BoxFuture<'a, Result<JobHandle, ProviderError>>;

    /// Observe a job once. Side-effect free and safe to repeat.
    fn poll<'a>(&'a self, handle: &'a JobHandle) -> BoxFuture<'a, Result<JobStatus, ProviderError>>;
}

/// A chat-completion model answering a single prompt.
pub trait TextModel: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ProviderError>>;
}

/// Status for a handle that already carries its artifact.
pub(crate) fn ready_status(handle: &JobHandle) -> Option<JobStatus> {
    handle.ready_url.clone().map(JobStatus::Succeeded)
}
