use eva_core::models::media::MediaKind;
use eva_providers::media::{JobHandle, JobRequest};

/// Lifecycle of a job inside the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Polling,
    Succeeded(String),
    Failed(String),
    TimedOut,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_) | Self::TimedOut)
    }
}

/// A job a provider has accepted. Lives only as long as the request that
/// created it.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub provider: &'static str,
    pub external_job_id: String,
    pub kind: MediaKind,
    pub prompt: String,
    pub source_media_url: Option<String>,
    pub state: JobState,
    pub attempts_used: u32,
    pub created_at: jiff::Timestamp,
}

impl GenerationJob {
    pub fn accepted(request: &JobRequest, handle: &JobHandle) -> Self {
        Self {
            provider: handle.provider,
            external_job_id: handle.job_id.clone(),
            kind: request.kind,
            prompt: request.prompt.clone(),
            source_media_url: request.source_media_url.clone(),
            state: JobState::Submitted,
            attempts_used: 0,
            created_at: jiff::Timestamp::now(),
        }
    }
}
