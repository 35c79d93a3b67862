use std::time::Duration;

use eva_core::models::media::MediaKind;
use eva_generation::job::{GenerationJob, JobState};
use eva_generation::poll::{Attempt, PollOutcome, PollPolicy, Poller, classify};
use eva_providers::error::ProviderError;
use eva_providers::media::{JobRequest, JobStatus, MediaProvider};

mod support;
use support::{FakeProvider, Submit};

async fn submit(provider: &FakeProvider) -> (GenerationJob, eva_providers::media::JobHandle) {
    let request = JobRequest::new(MediaKind::Image, "p");
    let handle = provider.submit(&request).await.expect("submit");
    (GenerationJob::accepted(&request, &handle), handle)
}

fn policy() -> PollPolicy {
    PollPolicy::new(Duration::from_secs(3), 20)
}

#[tokio::test(start_paused = true)]
async fn success_within_budget_returns_url() {
    let provider = FakeProvider::scripted(
        "p",
        Submit::Async,
        vec![
            Ok(JobStatus::Pending),
            Ok(JobStatus::Pending),
            Ok(JobStatus::Succeeded("https://cdn/x.jpg".to_string())),
        ],
    );
    let (mut job, handle) = submit(&provider).await;

    let start = tokio::time::Instant::now();
    let outcome = Poller::new(policy()).drive(&*provider, &mut job, &handle).await;

    assert_eq!(outcome, PollOutcome::Succeeded("https://cdn/x.jpg".to_string()));
    assert_eq!(provider.polls(), 3);
    assert_eq!(job.attempts_used, 3);
    assert_eq!(job.state, JobState::Succeeded("https://cdn/x.jpg".to_string()));
    assert_eq!(start.elapsed(), Duration::from_secs(9));
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_times_out_after_exact_attempts() {
    let provider = FakeProvider::new("p", Submit::Async);
    let (mut job, handle) = submit(&provider).await;

    let outcome = Poller::new(policy()).drive(&*provider, &mut job, &handle).await;

    assert_eq!(outcome, PollOutcome::TimedOut);
    assert_eq!(provider.polls(), 20);
    assert_eq!(job.state, JobState::TimedOut);
    assert!(job.state.is_terminal());
}

#[tokio::test(start_paused = true)]
async fn transport_errors_consume_attempts_but_do_not_end_the_job() {
    let provider = FakeProvider::scripted(
        "p",
        Submit::Async,
        vec![
            Err(ProviderError::Transport("connection reset".to_string())),
            Err(ProviderError::ResponseParse("bad json".to_string())),
            Ok(JobStatus::Succeeded("https://cdn/y.jpg".to_string())),
        ],
    );
    let (mut job, handle) = submit(&provider).await;

    let outcome = Poller::new(policy()).drive(&*provider, &mut job, &handle).await;

    assert_eq!(outcome, PollOutcome::Succeeded("https://cdn/y.jpg".to_string()));
    assert_eq!(job.attempts_used, 3);
}

#[tokio::test(start_paused = true)]
async fn provider_failure_stops_polling() {
    let provider = FakeProvider::scripted(
        "p",
        Submit::Async,
        vec![Ok(JobStatus::Failed("rejected".to_string()))],
    );
    let (mut job, handle) = submit(&provider).await;

    let outcome = Poller::new(policy()).drive(&*provider, &mut job, &handle).await;

    assert_eq!(outcome, PollOutcome::Failed("rejected".to_string()));
    assert_eq!(provider.polls(), 1);
}

#[tokio::test]
async fn ready_handle_is_never_polled() {
    let provider = FakeProvider::new("p", Submit::Ready("https://cdn/z.jpg".to_string()));
    let (mut job, handle) = submit(&provider).await;

    let outcome = Poller::new(policy()).drive(&*provider, &mut job, &handle).await;

    assert_eq!(outcome, PollOutcome::Succeeded("https://cdn/z.jpg".to_string()));
    assert_eq!(provider.polls(), 0);
}

#[test]
fn classification() {
    assert_eq!(classify(Ok(JobStatus::Pending)), Attempt::Transient);
    assert_eq!(
        classify(Err(ProviderError::Transport("x".to_string()))),
        Attempt::Transient
    );
    assert!(matches!(
        classify(Err(ProviderError::MissingCredential("kie"))),
        Attempt::Terminal(PollOutcome::Failed(_))
    ));
}

#[test]
fn default_policies() {
    let polling = eva_core::config::PollingConfig::default();
    assert_eq!(
        PollPolicy::for_kind(&polling, MediaKind::Image),
        PollPolicy::new(Duration::from_secs(3), 20)
    );
    assert_eq!(
        PollPolicy::for_kind(&polling, MediaKind::Video),
        PollPolicy::new(Duration::from_secs(10), 30)
    );
}
