use std::future::Future;
use std::pin::Pin;

use crate::error::StorageError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Durable home for artifact bytes.
pub trait ArtifactStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Store `bytes` under `key` (e.g. `images/1700000000000-ab12cd.jpg`) and
    /// return the URL the artifact is served from.
    fn put<'a>(
        &'a self,
        key: &'a str,
        bytes: Vec<u8>,
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<String, StorageError>>;
}
