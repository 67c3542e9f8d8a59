//! Periodic eviction of old job records.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use vrender_queue::JobStore;

use crate::metrics;

/// Spawn the reaper. It evicts terminal and queued jobs idle for longer
/// than `retention` every `interval`, until `shutdown` flips to `true`.
pub fn spawn_reaper(
    store: Arc<JobStore>,
    retention: Duration,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Job reaper started (retention {}s, every {}s)",
            retention.as_secs(),
            interval.as_secs()
        );
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(10)));
        // The first tick fires immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = store.evict_older_than(retention);
                    if evicted > 0 {
                        metrics::record_jobs_evicted(evicted);
                    }
                    debug!(evicted, remaining = store.len(), "Reaper pass");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Job reaper stopped");
    })
}
