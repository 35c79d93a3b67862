//! Remote artifact migration.
//!
//! Provider URLs expire. Once a job succeeds its artifact is copied into a
//! store the service owns, and the store's URL replaces the provider's.
//! Copy failures never fail the request: the provider URL is handed back
//! and the caller records it as the original.

use std::sync::Arc;

use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::Client;
use tracing::{info, warn};

use eva_core::config::MediaConfig;
use eva_core::media_paths;
use eva_core::models::media::{MediaKind, MediaResult};

use crate::error::StorageError;
use crate::local::LocalStore;
use crate::s3::S3Store;
use crate::store::ArtifactStore;

const SUFFIX_LEN: usize = 8;

/// Where an artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactRef {
    /// Copied into owned storage.
    Local(String),
    /// Copy failed; still hosted by the provider.
    Remote(String),
}

impl ArtifactRef {
    pub fn url(&self) -> &str {
        match self {
            Self::Local(url) | Self::Remote(url) => url,
        }
    }
}

impl From<ArtifactRef> for MediaResult {
    fn from(artifact: ArtifactRef) -> Self {
        match artifact {
            ArtifactRef::Local(url) => MediaResult::local(url),
            ArtifactRef::Remote(url) => MediaResult::remote(url),
        }
    }
}

pub struct ArtifactFetcher {
    client: Client,
    store: Arc<dyn ArtifactStore>,
}

impl ArtifactFetcher {
    pub fn new(client: Client, store: Arc<dyn ArtifactStore>) -> Self {
        Self { client, store }
    }

    /// S3 when a bucket is configured, the local media root otherwise.
    pub async fn from_config(client: Client, media: &MediaConfig) -> Self {
        let store: Arc<dyn ArtifactStore> = match &media.s3_bucket {
            Some(bucket) => {
                Arc::new(S3Store::from_env(bucket.clone(), media.s3_public_base_url.clone()).await)
            }
            None => Arc::new(LocalStore::from_config(media)),
        };
        info!(store = store.name(), "artifact store configured");
        Self::new(client, store)
    }

    /// Copy `remote_url` into owned storage.
    ///
    /// Never fails: any download or write error is logged and the remote URL
    /// is returned as [`ArtifactRef::Remote`].
    pub async fn persist(&self, remote_url: &str, kind: MediaKind) -> ArtifactRef {
        match self.try_persist(remote_url, kind).await {
            Ok(url) => {
                info!(kind = %kind, url = %url, store = self.store.name(), "artifact persisted");
                ArtifactRef::Local(url)
            }
            Err(e) => {
                warn!(
                    kind = %kind,
                    remote_url,
                    error = %e,
                    "artifact copy failed, keeping provider url"
                );
                ArtifactRef::Remote(remote_url.to_string())
            }
        }
    }

    async fn try_persist(&self, remote_url: &str, kind: MediaKind) -> Result<String, StorageError> {
        let response = self.client.get(remote_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Status {
                url: remote_url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?.to_vec();

        let name = media_paths::artifact_name(
            kind,
            jiff::Timestamp::now().as_millisecond(),
            &random_suffix(),
        );
        let key = media_paths::artifact_key(kind, &name);

        self.store.put(&key, bytes, kind.content_type()).await
    }
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}
