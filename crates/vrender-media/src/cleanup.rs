//! Best-effort removal of temp files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// A temp path that could not be removed. Never fails a job.
#[derive(Debug, Clone)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub message: String,
}

impl std::fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to remove {}: {}", self.path.display(), self.message)
    }
}

/// Remove every file in `paths`, then the directory `dir` if given and empty.
///
/// Files that are already gone are skipped; other failures are logged and
/// returned as warnings.
pub async fn remove_paths(paths: &[PathBuf], dir: Option<&Path>) -> Vec<CleanupWarning> {
    let mut warnings = Vec::new();

    for path in paths {
        match fs::remove_file(path).await {
            Ok(()) => debug!("Removed temp file {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Temp file {} already gone", path.display());
            }
            Err(e) => {
                warn!("Failed to remove temp file {}: {}", path.display(), e);
                warnings.push(CleanupWarning {
                    path: path.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    if let Some(dir) = dir {
        match fs::remove_dir(dir).await {
            Ok(()) => debug!("Removed scratch dir {}", dir.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!("Failed to remove scratch dir {}: {}", dir.display(), e);
                warnings.push(CleanupWarning {
                    path: dir.to_path_buf(),
                    message: e.to_string(),
                });
            }
        }
    }

    warnings
}
