use aws_sdk_s3::Client;
use aws_smithy_types::byte_stream::ByteStream;
use tracing::debug;

use crate::error::StorageError;
use crate::store::{ArtifactStore, BoxFuture};

/// Artifacts in an S3 bucket, served from a public base URL.
pub struct S3Store {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>, public_base_url: Option<String>) -> Self {
        let bucket = bucket.into();
        let public_base_url =
            public_base_url.unwrap_or_else(|| format!("https://{bucket}.s3.amazonaws.com"));
        Self {
            client,
            bucket,
            public_base_url,
        }
    }

    /// Build a store using the default AWS credential chain.
    pub async fn from_env(bucket: impl Into<String>, public_base_url: Option<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket, public_base_url)
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let len = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::PutObject(e.into_service_error().to_string()))?;

        debug!(bucket = %self.bucket, key, bytes = len, "artifact uploaded");
        Ok(public_object_url(&self.public_base_url, &self.bucket, key))
    }
}

impl ArtifactStore for S3Store {
    fn name(&self) -> &'static str {
        "s3"
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        bytes: Vec<u8>,
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(self.put_object(key, bytes, content_type))
    }
}

/// Public URL of an object.
///
/// `base` may be a template containing `{bucket}` and/or `{key}`. Otherwise
/// the key is appended, preceded by the bucket unless the base already
/// names it.
pub fn public_object_url(base: &str, bucket: &str, key: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.contains("{bucket}") || base.contains("{key}") {
        return base.replace("{bucket}", bucket).replace("{key}", key);
    }
    if base.contains(bucket) {
        format!("{base}/{key}")
    } else {
        format!("{base}/{bucket}/{key}")
    }
}
