//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use vrender_models::EncodingConfig;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root of the per-job scratch directories
    pub scratch_dir: PathBuf,
    /// ffmpeg binary name or path
    pub ffmpeg_path: PathBuf,
    /// ffprobe binary name or path
    pub ffprobe_path: PathBuf,
    /// Timeout for one ffmpeg invocation
    pub ffmpeg_timeout: Duration,
    /// Timeout for one HTTP fetch
    pub fetch_timeout: Duration,
    /// How long finished or stale job records are kept
    pub job_retention: Duration,
    /// How often the reaper runs
    pub reaper_interval: Duration,
    /// How long shutdown waits for the in-flight job
    pub shutdown_timeout: Duration,
    /// Encoder settings for segment clips and the final output
    pub encoding: EncodingConfig,
    /// Font file for the title overlay; fontconfig picks one when unset
    pub title_font: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from("/tmp/vrender"),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            ffmpeg_timeout: Duration::from_secs(600),
            fetch_timeout: Duration::from_secs(300),
            job_retention: Duration::from_secs(3600), // 1 hour
            reaper_interval: Duration::from_secs(60),
            shutdown_timeout: Duration::from_secs(30),
            encoding: EncodingConfig::default(),
            title_font: None,
        }
    }
}

fn env_secs(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn env_encoding(default: EncodingConfig) -> EncodingConfig {
    let mut encoding = default;
    if let Some(crf) = std::env::var("RENDER_VIDEO_CRF").ok().and_then(|s| s.parse().ok()) {
        encoding = encoding.with_crf(crf);
    }
    if let Ok(preset) = std::env::var("RENDER_VIDEO_PRESET") {
        if !preset.trim().is_empty() {
            encoding = encoding.with_preset(preset.trim());
        }
    }
    encoding
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            scratch_dir: std::env::var("RENDER_SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            ffmpeg_path: std::env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: std::env::var("FFPROBE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffprobe_path),
            ffmpeg_timeout: env_secs("RENDER_FFMPEG_TIMEOUT_SECS", defaults.ffmpeg_timeout),
            fetch_timeout: env_secs("RENDER_FETCH_TIMEOUT_SECS", defaults.fetch_timeout),
            job_retention: env_secs("RENDER_JOB_RETENTION_SECS", defaults.job_retention),
            reaper_interval: env_secs("RENDER_REAPER_INTERVAL_SECS", defaults.reaper_interval),
            shutdown_timeout: env_secs("RENDER_SHUTDOWN_TIMEOUT_SECS", defaults.shutdown_timeout),
            encoding: env_encoding(defaults.encoding),
            title_font: std::env::var("RENDER_TITLE_FONT_FILE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}
