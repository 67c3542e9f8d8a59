//! Storage error types.

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage misconfigured: {0}")]
    Config(String),

    /// The local file to publish does not exist.
    #[error("File to publish not found: {0}")]
    MissingFile(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage unreachable: {0}")]
    Unreachable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn missing_file(path: &std::path::Path) -> Self {
        Self::MissingFile(path.display().to_string())
    }

    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }
}
