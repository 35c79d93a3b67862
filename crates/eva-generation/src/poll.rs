//! Bounded polling of provider jobs.
//!
//! Each attempt sleeps for the policy interval, then polls once. An attempt
//! either ends the job or is transient; transport and parse errors are
//! transient and still consume the attempt. After `max_attempts` transient
//! attempts the job times out.

use std::time::Duration;

use tracing::{debug, info, warn};

use eva_core::config::PollingConfig;
use eva_core::models::media::MediaKind;
use eva_providers::error::ProviderError;
use eva_providers::media::{JobHandle, JobStatus, MediaProvider};

use crate::job::{GenerationJob, JobState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Image: 3s x 20. Video: 10s x 30. Unless configured otherwise.
    pub fn for_kind(polling: &PollingConfig, kind: MediaKind) -> Self {
        Self::new(polling.interval(kind), polling.max_attempts(kind))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded(String),
    Failed(String),
    TimedOut,
}

/// The classified result of one poll call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Terminal(PollOutcome),
    Transient,
}

pub fn classify(result: Result<JobStatus, ProviderError>) -> Attempt {
    match result {
        Ok(JobStatus::Succeeded(url)) => Attempt::Terminal(PollOutcome::Succeeded(url)),
        Ok(JobStatus::Failed(reason)) => Attempt::Terminal(PollOutcome::Failed(reason)),
        Ok(JobStatus::Pending) => Attempt::Transient,
        Err(ProviderError::MissingCredential(provider)) => Attempt::Terminal(PollOutcome::Failed(
            format!("{provider} API key is not configured"),
        )),
        Err(e) => {
            warn!(error = %e, "poll attempt failed");
            Attempt::Transient
        }
    }
}

pub struct Poller {
    policy: PollPolicy,
}

impl Poller {
    pub fn new(policy: PollPolicy) -> Self {
        Self { policy }
    }

    /// Drive `handle` to a terminal outcome, recording progress on `job`.
    ///
    /// A handle that already carries its artifact succeeds without a poll.
    /// Dropping the returned future cancels the remaining attempts.
    pub async fn drive(
        &self,
        provider: &dyn MediaProvider,
        job: &mut GenerationJob,
        handle: &JobHandle,
    ) -> PollOutcome {
        if let Some(url) = &handle.ready_url {
            job.state = JobState::Succeeded(url.clone());
            return PollOutcome::Succeeded(url.clone());
        }

        job.state = JobState::Polling;

        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;
            job.attempts_used = attempt;

            match classify(provider.poll(handle).await) {
                Attempt::Terminal(outcome) => {
                    info!(
                        provider = job.provider,
                        job_id = %job.external_job_id,
                        attempt,
                        outcome = ?outcome,
                        "job finished"
                    );
                    job.state = match &outcome {
                        PollOutcome::Succeeded(url) => JobState::Succeeded(url.clone()),
                        PollOutcome::Failed(reason) => JobState::Failed(reason.clone()),
                        PollOutcome::TimedOut => JobState::TimedOut,
                    };
                    return outcome;
                }
                Attempt::Transient => {
                    debug!(provider = job.provider, job_id = %job.external_job_id, attempt, "job pending");
                }
            }
        }

        warn!(
            provider = job.provider,
            job_id = %job.external_job_id,
            attempts = self.policy.max_attempts,
            "job timed out"
        );
        job.state = JobState::TimedOut;
        PollOutcome::TimedOut
    }
}
