//! Worker error types.
//!
//! The `Display` string of a `WorkerError` becomes the job's `error` field.

use thiserror::Error;
use vrender_media::MediaError;
use vrender_storage::StorageError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Source or overlay audio could not be downloaded
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// The transcoder failed, crashed or timed out
    #[error("Transcode failed: {0}")]
    Transcode(String),

    /// Upload of the final output failed
    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkerError {
    /// Fetch failure of `what` ("source", "audio").
    pub fn fetch(what: &str, err: &MediaError) -> Self {
        Self::Fetch(format!("{}: {}", what, err.describe()))
    }

    pub fn transcode(stage: &str, err: &MediaError) -> Self {
        Self::Transcode(format!("{}: {}", stage, err.describe()))
    }

    pub fn publish(err: &StorageError) -> Self {
        Self::Publish(err.to_string())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::Fetch(_) => "fetch",
            WorkerError::Transcode(_) => "transcode",
            WorkerError::Publish(_) => "publish",
            WorkerError::Io(_) => "io",
            WorkerError::Internal(_) => "internal",
        }
    }
}
