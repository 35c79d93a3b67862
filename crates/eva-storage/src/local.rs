use std::path::PathBuf;

use tracing::debug;

use eva_core::config::MediaConfig;
use eva_core::media_paths;

use crate::error::StorageError;
use crate::store::{ArtifactStore, BoxFuture};

/// Artifacts on the local filesystem, served by the HTTP layer under
/// `url_prefix`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    url_prefix: String,
    public_base_url: Option<String>,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
            public_base_url: None,
        }
    }

    pub fn from_config(media: &MediaConfig) -> Self {
        Self {
            root: media.root.clone(),
            url_prefix: media.url_prefix.clone(),
            public_base_url: media.public_base_url.clone(),
        }
    }

    /// Return fully qualified URLs under `base` instead of root-relative ones.
    pub fn with_public_base_url(mut self, base: impl Into<String>) -> Self {
        self.public_base_url = Some(base.into());
        self
    }

    fn url_for(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => media_paths::public_url(base, &self.url_prefix, key),
            None => media_paths::local_url(&self.url_prefix, key),
        }
    }

    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let path = self.root.join(key);
        let dir = path.parent().unwrap_or(self.root.as_path());
        tokio::fs::create_dir_all(dir).await?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let part = dir.join(format!(".{name}.part"));

        tokio::fs::write(&part, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&part, &path).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e.into());
        }

        debug!(path = %path.display(), bytes = bytes.len(), "artifact written");
        Ok(self.url_for(key))
    }
}

impl ArtifactStore for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        bytes: Vec<u8>,
        _content_type: &'a str,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(self.write(key, bytes))
    }
}
