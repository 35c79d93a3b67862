//! Role-to-provider wiring.
//!
//! The orchestrator asks for a provider by role (create an image, edit an
//! image, animate an image) and [`ProviderSet`] answers with whichever
//! concrete adapter the configuration assigned to that role.

use std::sync::Arc;

use tracing::info;

use eva_core::config::{EvaConfig, ProviderKind};
use eva_core::models::media::MediaKind;

use crate::client::build_client;
use crate::error::ProviderError;
use crate::fal::FalProvider;
use crate::kie::KieProvider;
use crate::media::{MediaProvider, TextModel};
use crate::runpod::RunPodProvider;
use crate::text::TextProvider;

#[derive(Clone)]
pub struct ProviderSet {
    pub image_create: Arc<dyn MediaProvider>,
    pub image_edit: Arc<dyn MediaProvider>,
    pub video: Arc<dyn MediaProvider>,
    pub text: Arc<dyn TextModel>,
}

impl ProviderSet {
    /// Instantiate the adapters named in `config.providers`.
    ///
    /// Fails when a role is assigned a provider that cannot serve it, e.g.
    /// RunPod for text-to-image.
    pub fn from_config(config: &EvaConfig) -> Result<Self, ProviderError> {
        let client = build_client()?;
        let p = &config.providers;

        let build = |kind: ProviderKind| -> Arc<dyn MediaProvider> {
            match kind {
                ProviderKind::Kie => Arc::new(KieProvider::new(
                    client.clone(),
                    config.credentials.kie.clone(),
                    p.kie.clone(),
                )),
                ProviderKind::RunPod => Arc::new(RunPodProvider::new(
                    client.clone(),
                    config.credentials.runpod.clone(),
                    p.runpod.clone(),
                )),
                ProviderKind::Fal => Arc::new(FalProvider::new(
                    client.clone(),
                    config.credentials.fal.clone(),
                    p.fal.clone(),
                )),
            }
        };

        if p.image_create == ProviderKind::RunPod {
            return Err(ProviderError::Unsupported {
                provider: "runpod",
                what: "images without a source image".to_string(),
            });
        }
        if p.image_edit == ProviderKind::Kie {
            return Err(ProviderError::Unsupported {
                provider: "kie",
                what: "image edits".to_string(),
            });
        }
        if p.video == ProviderKind::RunPod {
            return Err(ProviderError::Unsupported {
                provider: "runpod",
                what: "videos".to_string(),
            });
        }

        let set = Self {
            image_create: build(p.image_create),
            image_edit: build(p.image_edit),
            video: build(p.video),
            text: Arc::new(TextProvider::new(
                client.clone(),
                config.credentials.deepseek.clone(),
                p.deepseek.clone(),
            )),
        };

        info!(
            image_create = set.image_create.name(),
            image_edit = set.image_edit.name(),
            video = set.video.name(),
            "providers configured"
        );

        Ok(set)
    }

    /// The provider responsible for a request. Image requests with a
    /// non-blank source go to the edit provider.
    pub fn for_request(&self, kind: MediaKind, source_media_url: Option<&str>) -> &Arc<dyn MediaProvider> {
        match kind {
            MediaKind::Image if source_media_url.is_some_and(|s| !s.trim().is_empty()) => {
                &self.image_edit
            }
            MediaKind::Image => &self.image_create,
            MediaKind::Video => &self.video,
        }
    }
}
