//! Field-set updates applied to a stored job.

use chrono::Utc;
use vrender_models::{JobStatus, RenderJob};

/// Non-`None` fields are applied together, under one lock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub final_url: Option<String>,
    pub error: Option<String>,
}

impl JobUpdate {
    /// Claim the job for processing.
    pub fn processing() -> Self {
        Self {
            status: Some(JobStatus::Processing),
            ..Default::default()
        }
    }

    /// Advance progress only.
    pub fn progress(progress: u8) -> Self {
        Self {
            progress: Some(progress),
            ..Default::default()
        }
    }

    /// Publish succeeded: status, progress 100 and URL land together.
    pub fn completed(final_url: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            progress: Some(100),
            final_url: Some(final_url.into()),
            error: None,
        }
    }

    /// A stage failed.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Error),
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

/// What happened to an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// Unknown id, e.g. evicted
    Missing,
    /// Would break the lifecycle (terminal job, illegal transition,
    /// completion without a URL)
    Rejected,
}

/// Apply `update` to `job`, keeping the record's invariants.
///
/// - terminal jobs never change
/// - progress never decreases and only reaches 100 with `completed`
/// - `final_url` is only set with `completed`, `error` only with `error`
pub(crate) fn apply(job: &mut RenderJob, update: JobUpdate) -> UpdateOutcome {
    if job.status.is_terminal() {
        return UpdateOutcome::Rejected;
    }

    let next_status = update.status.unwrap_or(job.status);
    if !job.status.can_transition_to(next_status) {
        return UpdateOutcome::Rejected;
    }

    match next_status {
        JobStatus::Completed => {
            let Some(url) = update.final_url.filter(|u| !u.is_empty()) else {
                return UpdateOutcome::Rejected;
            };
            job.final_url = Some(url);
            job.error = None;
            job.progress = 100;
        }
        JobStatus::Error => {
            let message = update
                .error
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "render failed".to_string());
            job.error = Some(message);
            job.final_url = None;
            if let Some(progress) = update.progress {
                job.progress = job.progress.max(progress.min(99));
            }
        }
        JobStatus::Queued | JobStatus::Processing => {
            if let Some(progress) = update.progress {
                job.progress = job.progress.max(progress.min(99));
            }
        }
    }

    job.status = next_status;
    job.updated_at = Utc::now();
    UpdateOutcome::Applied
}
