//! Application state.

use std::path::PathBuf;
use std::sync::Arc;

use vrender_queue::JobStore;
use vrender_storage::ObjectStore;
use vrender_worker::WorkerHandle;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub jobs: Arc<JobStore>,
    pub worker: WorkerHandle,
    pub storage: Arc<dyn ObjectStore>,
    /// Root of the worker's scratch directories, checked by `/ready`
    pub scratch_dir: PathBuf,
    /// ffmpeg binary the worker uses, checked by `/ready`
    pub ffmpeg_path: PathBuf,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        jobs: Arc<JobStore>,
        worker: WorkerHandle,
        storage: Arc<dyn ObjectStore>,
        scratch_dir: impl Into<PathBuf>,
        ffmpeg_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            jobs,
            worker,
            storage,
            scratch_dir: scratch_dir.into(),
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}
