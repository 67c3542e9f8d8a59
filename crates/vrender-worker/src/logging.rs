//! Structured job logging.

use std::time::Instant;

use tracing::{error, info, warn, Span};
use vrender_models::JobId;

/// Logs one job's lifecycle with its id and elapsed time attached.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: JobId,
    started: Instant,
}

impl JobLogger {
    pub fn new(job_id: &JobId) -> Self {
        Self {
            job_id: job_id.clone(),
            started: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    pub fn started(&self, detail: &str) {
        info!(job_id = %self.job_id, "Render started: {}", detail);
    }

    /// A pipeline stage finished.
    pub fn stage(&self, stage: &str, detail: &str) {
        info!(
            job_id = %self.job_id,
            stage,
            elapsed_ms = self.elapsed_ms() as u64,
            "{}",
            detail
        );
    }

    pub fn warning(&self, detail: &str) {
        warn!(job_id = %self.job_id, "Render warning: {}", detail);
    }

    pub fn failed(&self, reason: &str) {
        error!(
            job_id = %self.job_id,
            elapsed_ms = self.elapsed_ms() as u64,
            "Render failed: {}",
            reason
        );
    }

    pub fn completed(&self, url: &str) {
        info!(
            job_id = %self.job_id,
            elapsed_ms = self.elapsed_ms() as u64,
            final_url = url,
            "Render completed"
        );
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Span entered around the pipeline so nested logs carry the job id.
    pub fn span(&self) -> Span {
        tracing::info_span!("render", job_id = %self.job_id)
    }
}
