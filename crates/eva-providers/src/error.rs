use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} API key is not configured")]
    MissingCredential(&'static str),

    #[error("{provider} cannot produce {what}")]
    Unsupported { provider: &'static str, what: String },

    #[error("provider rejected the request: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("response parsing failed: {0}")]
    ResponseParse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
