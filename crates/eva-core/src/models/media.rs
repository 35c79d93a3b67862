use serde::{Deserialize, Serialize};

use super::transaction::TransactionType;

/// The kind of media a provider is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Directory that artifacts of this kind are stored under.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Video => "videos",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Image => "jpg",
            Self::Video => "mp4",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Image => "image/jpeg",
            Self::Video => "video/mp4",
        }
    }

    /// Ledger entry type used when this kind of media is charged for.
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Self::Image => TransactionType::ImageGeneration,
            Self::Video => TransactionType::VideoGeneration,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => f.write_str("image"),
            Self::Video => f.write_str("video"),
        }
    }
}

/// The normalized outcome of a generation request.
///
/// An empty `url` is a soft failure: the request was accepted (and possibly
/// charged) but produced nothing. `original_url` is only set when the
/// artifact could not be copied into local storage and `url` still points
/// at the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaResult {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
}

impl MediaResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn local(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            original_url: None,
        }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            original_url: Some(url.clone()),
            url,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
    }
}
