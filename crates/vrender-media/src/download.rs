//! Remote media fetching over HTTP(S).
//!
//! Bodies are streamed straight to disk. Only `http` and `https` URLs are
//! fetched, matching what submission validation accepts.

use futures_util::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use crate::error::{MediaError, MediaResult};

/// Default total timeout for one fetch.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 300;

/// Fallback extension when the URL path has none.
const DEFAULT_EXTENSION: &str = "bin";

/// Downloads remote media into local files.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    /// Create a fetcher with the given total timeout per request.
    pub fn new(timeout_secs: u64) -> MediaResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                MediaError::download_failed(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, timeout_secs })
    }

    /// Fetch `url` into `dest`, returning the number of bytes written.
    ///
    /// Non-2xx responses, network errors and timeouts are reported as fetch
    /// errors. A partially written file is left for the caller's cleanup.
    pub async fn fetch_to_file(&self, url: &str, dest: impl AsRef<Path>) -> MediaResult<u64> {
        let dest = dest.as_ref();

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let parsed = Url::parse(url)
            .map_err(|e| MediaError::download_failed(format!("invalid URL {}: {}", url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(MediaError::download_failed(format!(
                "unsupported URL scheme {}: {}",
                parsed.scheme(),
                url
            )));
        }

        debug!("Fetching {} -> {}", url, dest.display());

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let data = chunk.map_err(|e| self.map_reqwest_error(url, e))?;
            file.write_all(&data).await?;
            written += data.len() as u64;
        }
        file.flush().await?;

        debug!("Fetched {} bytes from {}", written, url);
        Ok(written)
    }

    fn map_reqwest_error(&self, url: &str, e: reqwest::Error) -> MediaError {
        if e.is_timeout() {
            MediaError::download_failed(format!(
                "fetching {} timed out after {} seconds",
                url, self.timeout_secs
            ))
        } else {
            MediaError::download_failed(format!("fetching {} failed: {}", url, e))
        }
    }
}

/// File extension for a downloaded URL, taken from the last path segment.
///
/// Only short alphanumeric extensions are accepted; anything else falls back
/// to `bin` so a hostile URL cannot shape the temp file name.
pub fn extension_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()))
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
