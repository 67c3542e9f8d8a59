//! The storage capability used by the publish stage.

use async_trait::async_trait;
use std::path::Path;
use vrender_models::JobId;

use crate::error::{StorageError, StorageResult};

/// Content type of rendered outputs.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Stores files and hands back durable public URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name for logs and readiness output.
    fn name(&self) -> &str;

    /// Store the file at `path` under `key` and return its public URL.
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<String>;

    /// Cheap reachability check for readiness checks.
    async fn check(&self) -> StorageResult<()>;
}

/// Object key of a job's rendered output: `<prefix>/<jobId>/output.mp4`.
pub fn render_output_key(prefix: &str, job_id: &JobId) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}/output.mp4", job_id)
    } else {
        format!("{}/{}/output.mp4", prefix, job_id)
    }
}

/// Reject keys that are empty, absolute or escape their prefix.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty()
        || key.starts_with('/')
        || key.split('/').any(|part| part.is_empty() || part == "..")
    {
        return Err(StorageError::invalid_key(key));
    }
    Ok(())
}

/// Join a public base URL and a key with exactly one slash.
pub(crate) fn join_public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}
