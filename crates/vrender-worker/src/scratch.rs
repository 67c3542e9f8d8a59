//! Per-job temp files.

use std::path::{Path, PathBuf};
use vrender_media::{remove_paths, CleanupWarning};
use vrender_models::JobId;

/// Tracks every temp file a job creates under `<scratch>/<jobId>/`.
///
/// `cleanup` removes them and the directory. If the value is dropped
/// without `cleanup` (a panicking stage), the files are removed
/// synchronously on drop.
#[derive(Debug)]
pub struct JobScratch {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cleaned: bool,
}

impl JobScratch {
    pub fn new(root: &Path, job_id: &JobId) -> Self {
        Self {
            dir: root.join(job_id.as_str()),
            files: Vec::new(),
            cleaned: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the job directory.
    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Register `name` inside the job directory and return its path.
    pub fn track(&mut self, name: impl AsRef<Path>) -> PathBuf {
        let path = self.dir.join(name);
        self.files.push(path.clone());
        path
    }

    /// Remove every tracked file, then the directory.
    pub async fn cleanup(mut self) -> Vec<CleanupWarning> {
        self.cleaned = true;
        remove_paths(&self.files, Some(&self.dir)).await
    }
}

impl Drop for JobScratch {
    fn drop(&mut self) {
        if self.cleaned {
            return;
        }
        tracing::warn!(
            dir = %self.dir.display(),
            "JobScratch dropped without cleanup(), removing files synchronously"
        );
        for file in &self.files {
            let _ = std::fs::remove_file(file);
        }
        let _ = std::fs::remove_dir(&self.dir);
    }
}
