//! Worker loop.
//!
//! One job is processed at a time. The loop claims the oldest queued job,
//! runs the pipeline while holding the single worker permit, records the
//! terminal status, and moves on. With nothing queued it sleeps until a
//! submission calls `WorkerHandle::try_advance`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{watch, Notify, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};
use vrender_models::RenderJob;
use vrender_queue::{JobStore, JobUpdate, UpdateOutcome};

use crate::error::WorkerError;
use crate::logging::JobLogger;
use crate::metrics;
use crate::pipeline::RenderPipeline;

/// Shared control surface of a running worker.
#[derive(Clone)]
pub struct WorkerHandle {
    wake: Arc<Notify>,
    guard: Arc<Semaphore>,
    running: Arc<AtomicBool>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl WorkerHandle {
    /// Ask the worker to look for queued work.
    ///
    /// Never blocks. A wakeup sent while the worker is busy is kept and
    /// consumed when the current job finishes.
    pub fn try_advance(&self) {
        self.wake.notify_one();
    }

    /// Whether a job is in flight.
    pub fn is_busy(&self) -> bool {
        self.guard.available_permits() == 0
    }

    /// Whether the loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop after the in-flight job, if any.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        self.wake.notify_one();
    }

    /// Receiver that flips to `true` on shutdown, for companion tasks.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

/// Single-slot worker draining the job store in FIFO order.
pub struct RenderWorker {
    store: Arc<JobStore>,
    pipeline: Arc<RenderPipeline>,
    handle: WorkerHandle,
}

impl RenderWorker {
    pub fn new(store: Arc<JobStore>, pipeline: Arc<RenderPipeline>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            store,
            pipeline,
            handle: WorkerHandle {
                wake: Arc::new(Notify::new()),
                guard: Arc::new(Semaphore::new(1)),
                running: Arc::new(AtomicBool::new(false)),
                shutdown: Arc::new(shutdown),
            },
        }
    }

    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    /// Run until shutdown.
    pub async fn run(self) {
        let mut shutdown_rx = self.handle.shutdown.subscribe();
        self.handle.running.store(true, Ordering::SeqCst);
        info!(
            transcoder = self.pipeline.transcoder_name(),
            storage = self.pipeline.storage_name(),
            "Render worker started"
        );

        'outer: loop {
            // Drain everything queued
            loop {
                if *shutdown_rx.borrow() {
                    break 'outer;
                }

                let permit = match Arc::clone(&self.handle.guard).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break 'outer,
                };

                let Some(job) = self.store.claim_next() else {
                    break;
                };
                metrics::set_queue_depth(self.store.list_queued().len());
                self.process(job, permit).await;
            }

            tokio::select! {
                _ = self.handle.wake.notified() => {
                    debug!("Worker woken");
                }
                _ = shutdown_rx.changed() => {}
            }
        }

        self.handle.running.store(false, Ordering::SeqCst);
        info!("Render worker stopped");
    }

    /// Process one claimed job. The permit is released when this returns,
    /// whatever the outcome.
    async fn process(&self, job: RenderJob, permit: OwnedSemaphorePermit) {
        let _permit = permit;
        let id = job.id.clone();
        let logger = JobLogger::new(&id);
        logger.started(&format!(
            "{} segment(s), title: {}, audio overlay: {}",
            job.segments.len(),
            job.options.title.is_some(),
            job.options.audio_url.is_some()
        ));
        metrics::record_job_started();
        let started = Instant::now();

        // A panicking stage must not take the loop down with it
        let pipeline = Arc::clone(&self.pipeline);
        let store = Arc::clone(&self.store);
        let task = tokio::spawn(async move { pipeline.run(&job, store).await });
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(WorkerError::internal(format!("render task aborted: {}", e))),
        };

        match result {
            Ok(url) => match self.store.update(&id, JobUpdate::completed(url.clone())) {
                UpdateOutcome::Applied => {
                    metrics::record_job_completed(started.elapsed().as_secs_f64());
                    logger.completed(&url);
                }
                outcome => {
                    warn!(job_id = %id, ?outcome, url = %url, "Could not record completion");
                    // Never leave a claimed job in processing
                    let reason = "publish returned no URL";
                    let fallback = self.store.update(&id, JobUpdate::failed(reason));
                    if fallback != UpdateOutcome::Applied {
                        warn!(job_id = %id, outcome = ?fallback, "Could not record failure");
                    }
                    metrics::record_job_failed("publish");
                    logger.failed(reason);
                }
            },
            Err(e) => {
                let outcome = self.store.update(&id, JobUpdate::failed(e.to_string()));
                if outcome != UpdateOutcome::Applied {
                    warn!(job_id = %id, ?outcome, "Could not record failure");
                }
                metrics::record_job_failed(e.kind());
                logger.failed(&e.to_string());
            }
        }
    }
}
