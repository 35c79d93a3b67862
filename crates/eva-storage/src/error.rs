use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("download failed: {0}")]
    Download(String),

    #[error("download of {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 PutObject error: {0}")]
    PutObject(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        Self::Download(e.to_string())
    }
}
