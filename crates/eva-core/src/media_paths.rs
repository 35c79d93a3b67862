//! Media artifact naming and URL conventions.
//!
//! Pure string functions with no filesystem or network dependency. These define
//! the canonical layout of generated artifacts under the media root.

use crate::models::media::MediaKind;

/// URL prefix under which the local media root is served.
pub const DEFAULT_URL_PREFIX: &str = "/uploads";

/// `{epoch-millis}-{suffix}.{jpg|mp4}`
pub fn artifact_name(kind: MediaKind, epoch_millis: i64, suffix: &str) -> String {
    format!("{epoch_millis}-{suffix}.{}", kind.extension())
}

/// Storage key relative to the media root, e.g. `images/1700000000000-ab12cd.jpg`.
pub fn artifact_key(kind: MediaKind, name: &str) -> String {
    format!("{}/{name}", kind.namespace())
}

/// Root-relative URL for a stored key, e.g. `/uploads/images/….jpg`.
pub fn local_url(url_prefix: &str, key: &str) -> String {
    format!("{}/{key}", url_prefix.trim_end_matches('/'))
}

/// Fully qualified URL for a stored key under the service's public host.
pub fn public_url(public_base_url: &str, url_prefix: &str, key: &str) -> String {
    let base = public_base_url.trim_end_matches('/');
    let prefix = url_prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{base}/{key}")
    } else {
        format!("{base}/{prefix}/{key}")
    }
}

/// Turn a root-relative media URL into one a third-party provider can fetch.
///
/// Absolute URLs are returned unchanged, as are root-relative ones when no
/// public base URL is configured.
pub fn absolutize(url: &str, public_base_url: Option<&str>) -> String {
    match public_base_url {
        Some(base) if url.starts_with('/') => {
            format!("{}{url}", base.trim_end_matches('/'))
        }
        _ => url.to_string(),
    }
}
