use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration value for {key}: {value}")]
    InvalidConfig { key: String, value: String },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}
