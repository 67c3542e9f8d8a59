//! Local directory store for development and tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use url::Url;

use crate::error::{StorageError, StorageResult};
use crate::store::{join_public_url, validate_key, ObjectStore};

/// Copies outputs into a directory, optionally served under a base URL.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalStore {
    /// Store under `root`. Without a base URL, `file://` URLs are returned.
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.filter(|u| !u.trim().is_empty()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Public URL of a stored object.
    pub fn public_url(&self, key: &str) -> StorageResult<String> {
        match &self.public_base_url {
            Some(base) => Ok(join_public_url(base, key)),
            None => {
                let path = self.object_path(key);
                let absolute = if path.is_absolute() {
                    path
                } else {
                    std::env::current_dir()?.join(path)
                };
                Url::from_file_path(&absolute)
                    .map(|u| u.to_string())
                    .map_err(|_| StorageError::invalid_key(key))
            }
        }
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn put_file(&self, path: &Path, key: &str, _content_type: &str) -> StorageResult<String> {
        validate_key(key)?;
        if !path.exists() {
            return Err(StorageError::missing_file(path));
        }

        let dest = self.object_path(key);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        debug!("Copying {} to {}", path.display(), dest.display());
        let bytes = fs::copy(path, &dest)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", dest.display(), e)))?;

        info!("Stored {} ({} bytes)", key, bytes);
        self.public_url(key)
    }

    async fn check(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}
