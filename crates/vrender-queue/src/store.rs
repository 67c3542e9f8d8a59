//! The job registry.

use chrono::{Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info};
use vrender_models::{validate_submission, JobId, JobStatus, RenderJob, RenderOptions, Segment};

use crate::error::{StoreError, StoreResult};
use crate::update::{apply, JobUpdate, UpdateOutcome};

/// Per-status job counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueCounts {
    pub queued: usize,
    pub processing: usize,
    pub completed: usize,
    pub error: usize,
    pub total: usize,
}

struct Entry {
    /// Insertion order, breaks ties between equal timestamps
    seq: u64,
    job: RenderJob,
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<JobId, Entry>,
    next_seq: u64,
}

/// In-memory job registry.
///
/// Readers (status polls) and the single writer (the worker) share one
/// `RwLock`; every update is applied atomically per field set. No async
/// work happens while the lock is held.
#[derive(Default)]
pub struct JobStore {
    inner: RwLock<Inner>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate and insert a new `queued` job.
    pub fn create(
        &self,
        source_url: impl Into<String>,
        segments: Vec<Segment>,
        options: RenderOptions,
    ) -> StoreResult<JobId> {
        let source_url = source_url.into().trim().to_string();
        let options = options.normalized();
        validate_submission(&source_url, &segments, &options)?;

        let job = RenderJob::new(source_url, segments, options);
        let id = job.id.clone();

        let mut inner = self.write();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.jobs.insert(id.clone(), Entry { seq, job });

        debug!(job_id = %id, "Job queued");
        Ok(id)
    }

    /// Snapshot of a job.
    pub fn get(&self, id: &JobId) -> StoreResult<RenderJob> {
        self.read()
            .jobs
            .get(id)
            .map(|entry| entry.job.clone())
            .ok_or_else(|| StoreError::not_found(id))
    }

    /// Apply an update. Unknown ids are a no-op.
    pub fn update(&self, id: &JobId, update: JobUpdate) -> UpdateOutcome {
        let mut inner = self.write();
        match inner.jobs.get_mut(id) {
            Some(entry) => {
                let outcome = apply(&mut entry.job, update);
                if outcome == UpdateOutcome::Rejected {
                    debug!(job_id = %id, status = %entry.job.status, "Update rejected");
                }
                outcome
            }
            None => UpdateOutcome::Missing,
        }
    }

    /// Queued job ids, oldest first.
    pub fn list_queued(&self) -> Vec<JobId> {
        let inner = self.read();
        let mut queued: Vec<&Entry> = inner
            .jobs
            .values()
            .filter(|entry| entry.job.status == JobStatus::Queued)
            .collect();
        queued.sort_by(|a, b| a.job.created_at.cmp(&b.job.created_at).then(a.seq.cmp(&b.seq)));
        queued.into_iter().map(|entry| entry.job.id.clone()).collect()
    }

    /// Move the oldest queued job to `processing` and return it.
    pub fn claim_next(&self) -> Option<RenderJob> {
        let mut inner = self.write();
        let id = inner
            .jobs
            .values()
            .filter(|entry| entry.job.status == JobStatus::Queued)
            .min_by(|a, b| a.job.created_at.cmp(&b.job.created_at).then(a.seq.cmp(&b.seq)))
            .map(|entry| entry.job.id.clone())?;

        let entry = inner.jobs.get_mut(&id)?;
        match apply(&mut entry.job, JobUpdate::processing()) {
            UpdateOutcome::Applied => Some(entry.job.clone()),
            _ => None,
        }
    }

    /// Id of the job currently processing, if any.
    pub fn in_flight(&self) -> Option<JobId> {
        self.read()
            .jobs
            .values()
            .find(|entry| entry.job.status == JobStatus::Processing)
            .map(|entry| entry.job.id.clone())
    }

    /// Remove terminal and queued jobs not updated within `max_age`.
    ///
    /// Processing jobs are never evicted. Returns how many were removed.
    pub fn evict_older_than(&self, max_age: Duration) -> usize {
        let max_age =
            ChronoDuration::from_std(max_age).unwrap_or_else(|_| ChronoDuration::days(36500));
        let Some(cutoff) = Utc::now().checked_sub_signed(max_age) else {
            return 0;
        };

        let mut inner = self.write();
        let before = inner.jobs.len();
        inner.jobs.retain(|_, entry| {
            entry.job.status == JobStatus::Processing || entry.job.updated_at > cutoff
        });
        let evicted = before - inner.jobs.len();

        if evicted > 0 {
            info!("Evicted {} jobs older than {}s", evicted, max_age.num_seconds());
        }
        evicted
    }

    /// Per-status counts.
    pub fn counts(&self) -> QueueCounts {
        let inner = self.read();
        let mut counts = QueueCounts {
            total: inner.jobs.len(),
            ..Default::default()
        };
        for entry in inner.jobs.values() {
            match entry.job.status {
                JobStatus::Queued => counts.queued += 1,
                JobStatus::Processing => counts.processing += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.read().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
