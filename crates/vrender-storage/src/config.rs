//! Backend selection.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::client::{R2Client, R2Config};
use crate::error::{StorageError, StorageResult};
use crate::local::LocalStore;
use crate::store::ObjectStore;

/// Which `ObjectStore` implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    R2,
    #[default]
    Local,
}

impl std::str::FromStr for StorageBackend {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r2" | "s3" => Ok(StorageBackend::R2),
            "local" | "" => Ok(StorageBackend::Local),
            other => Err(StorageError::config(format!("unknown STORAGE_BACKEND: {}", other))),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Key prefix for rendered outputs
    pub key_prefix: String,
    /// Root directory of the local backend
    pub local_dir: PathBuf,
    /// Base URL the local directory is served from
    pub local_public_base_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            key_prefix: "renders".to_string(),
            local_dir: PathBuf::from("/tmp/vrender/public"),
            local_public_base_url: None,
        }
    }
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let defaults = Self::default();

        let backend = match std::env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.backend,
        };

        Ok(Self {
            backend,
            key_prefix: std::env::var("R2_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            local_dir: std::env::var("LOCAL_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.local_dir),
            local_public_base_url: std::env::var("LOCAL_PUBLIC_BASE_URL").ok(),
        })
    }
}

/// Build the configured store. R2 credentials are read from the environment.
pub fn build_store(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    match config.backend {
        StorageBackend::R2 => {
            let client = R2Client::new(R2Config::from_env()?)?;
            info!("Using R2 object storage");
            Ok(Arc::new(client))
        }
        StorageBackend::Local => {
            info!("Using local object storage at {}", config.local_dir.display());
            Ok(Arc::new(LocalStore::new(
                config.local_dir.clone(),
                config.local_public_base_url.clone(),
            )))
        }
    }
}
