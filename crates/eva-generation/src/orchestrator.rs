//! The generation pipeline.
//!
//! ```text
//! CheckFunds -> Debited -> Submitted -> Polled -> Fetched -> Done
//!      \
//!       Rejected (insufficient funds, unknown user)
//! ```
//!
//! Only the steps before the debit can fail the request. From `Debited`
//! on, every provider or storage problem ends in an empty [`MediaResult`]
//! and the charge stands unless refunds are switched on.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use eva_core::config::{EvaConfig, PollingConfig, Pricing, Prompts};
use eva_core::media_paths;
use eva_core::models::media::{MediaKind, MediaResult};
use eva_core::models::transaction::TransactionType;
use eva_ledger::ledger::Ledger;
use eva_providers::media::JobRequest;
use eva_providers::registry::ProviderSet;
use eva_storage::artifact::ArtifactFetcher;

use crate::error::GenerationError;
use crate::job::GenerationJob;
use crate::poll::{PollOutcome, PollPolicy, Poller};

/// Who pays for a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Billing {
    /// Debit the user before any provider work starts.
    Charge(Uuid),
    /// Free to the caller; no balance check.
    Waived,
}

#[derive(Debug, Clone, Copy)]
struct Charge {
    user_id: Uuid,
    amount: Decimal,
    description: &'static str,
}

pub struct Orchestrator {
    ledger: Arc<Ledger>,
    providers: ProviderSet,
    fetcher: Arc<ArtifactFetcher>,
    pricing: Pricing,
    polling: PollingConfig,
    pub(crate) prompts: Prompts,
    public_base_url: Option<String>,
}

impl Orchestrator {
    pub fn new(
        config: &EvaConfig,
        ledger: Arc<Ledger>,
        providers: ProviderSet,
        fetcher: Arc<ArtifactFetcher>,
    ) -> Self {
        Self {
            ledger,
            providers,
            fetcher,
            pricing: config.pricing.clone(),
            polling: config.polling.clone(),
            prompts: config.prompts.clone(),
            public_base_url: config.media.public_base_url.clone(),
        }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub(crate) fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    /// Generate an image, editing `base_image_url` when one is given.
    pub async fn generate_image(
        &self,
        prompt: &str,
        base_image_url: Option<&str>,
        billing: Billing,
    ) -> Result<MediaResult, GenerationError> {
        let charge = self
            .charge(MediaKind::Image, billing, "Image generation")
            .await?;

        let mut request = JobRequest::new(MediaKind::Image, prompt);
        if let Some(base) = non_blank(base_image_url) {
            request = request.with_source(self.fetchable(base));
        }

        let result = self.produce(&request).await;
        Ok(self.settle(charge, result).await)
    }

    /// Generate a video from `base_image_url`, or from a freshly generated
    /// image of `prompt` when none is given. The intermediate image is free
    /// and is not copied into local storage.
    pub async fn generate_video(
        &self,
        prompt: &str,
        base_image_url: Option<&str>,
        billing: Billing,
    ) -> Result<MediaResult, GenerationError> {
        let charge = self
            .charge(MediaKind::Video, billing, "Video generation")
            .await?;

        let source = match non_blank(base_image_url) {
            Some(base) => Some(self.fetchable(base)),
            None => {
                info!("no base image, generating one for the video");
                self.run_job(&JobRequest::new(MediaKind::Image, prompt)).await
            }
        };

        let result = match source {
            Some(source) => {
                self.produce(&JobRequest::new(MediaKind::Video, prompt).with_source(source))
                    .await
            }
            None => {
                error!("no source image available for video generation");
                MediaResult::empty()
            }
        };

        Ok(self.settle(charge, result).await)
    }

    /// Animate an existing image with the companion speaking `spoken_text`.
    pub async fn generate_video_from_image(
        &self,
        image_url: &str,
        spoken_text: &str,
        billing: Billing,
    ) -> Result<MediaResult, GenerationError> {
        let charge = self
            .charge(MediaKind::Video, billing, "Video generation from image")
            .await?;

        let prompt = self.prompts.spoken_video.replace("{text}", spoken_text);
        let mut request = JobRequest::new(MediaKind::Video, prompt);
        if let Some(image) = non_blank(Some(image_url)) {
            request = request.with_source(self.fetchable(image));
        }

        let result = self.produce(&request).await;
        Ok(self.settle(charge, result).await)
    }

    async fn charge(
        &self,
        kind: MediaKind,
        billing: Billing,
        description: &'static str,
    ) -> Result<Option<Charge>, GenerationError> {
        let user_id = match billing {
            Billing::Charge(user_id) => user_id,
            Billing::Waived => return Ok(None),
        };

        let amount = self.pricing.price_for(kind);
        if amount <= Decimal::ZERO {
            return Ok(None);
        }

        self.ledger
            .debit(user_id, amount, kind.transaction_type(), description)
            .await?;

        Ok(Some(Charge {
            user_id,
            amount,
            description,
        }))
    }

    /// Credit the charge back if refunds are on and nothing was produced.
    async fn settle(&self, charge: Option<Charge>, result: MediaResult) -> MediaResult {
        if !result.is_empty() || !self.pricing.refund_on_failure {
            return result;
        }
        let Some(charge) = charge else {
            return result;
        };

        let description = format!("Refund: {}", charge.description);
        match self
            .ledger
            .credit(charge.user_id, charge.amount, TransactionType::Deposit, &description)
            .await
        {
            Ok(_) => info!(user_id = %charge.user_id, amount = %charge.amount, "charge refunded"),
            Err(e) => error!(user_id = %charge.user_id, error = %e, "refund failed"),
        }
        result
    }

    /// Run a job and copy its artifact into owned storage.
    pub(crate) async fn produce(&self, request: &JobRequest) -> MediaResult {
        match self.run_job(request).await {
            Some(remote) => self.fetcher.persist(&remote, request.kind).await.into(),
            None => MediaResult::empty(),
        }
    }

    /// Submit and poll. Returns the provider's artifact URL.
    async fn run_job(&self, request: &JobRequest) -> Option<String> {
        let provider = self
            .providers
            .for_request(request.kind, request.source_media_url.as_deref());

        let handle = match provider.submit(request).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(provider = provider.name(), kind = %request.kind, error = %e, "submission failed");
                return None;
            }
        };

        let mut job = GenerationJob::accepted(request, &handle);
        let poller = Poller::new(PollPolicy::for_kind(&self.polling, request.kind));

        match poller.drive(&**provider, &mut job, &handle).await {
            PollOutcome::Succeeded(url) => Some(url),
            PollOutcome::Failed(reason) => {
                warn!(provider = job.provider, job_id = %job.external_job_id, reason = %reason, "job failed");
                None
            }
            PollOutcome::TimedOut => None,
        }
    }

    /// Make a locally served URL reachable from a provider.
    fn fetchable(&self, url: &str) -> String {
        media_paths::absolutize(url, self.public_base_url.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
