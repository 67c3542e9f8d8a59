//! Job store error types.

use thiserror::Error;
use vrender_models::{JobId, ValidationError};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl StoreError {
    pub fn not_found(id: &JobId) -> Self {
        Self::NotFound(id.clone())
    }
}
