//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};

/// Progress information from FFmpeg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Output time as string (HH:MM:SS.microseconds)
    pub out_time: String,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Calculate progress percentage given total duration in milliseconds.
    pub fn percentage(&self, total_duration_ms: i64) -> f64 {
        if total_duration_ms <= 0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / total_duration_ms as f64) * 100.0).clamp(0.0, 100.0)
    }

    /// Fraction (0.0..=1.0) of an expected output length in seconds.
    pub fn fraction_of(&self, total_secs: f64) -> f64 {
        if self.is_complete {
            return 1.0;
        }
        self.percentage((total_secs * 1000.0) as i64) / 100.0
    }
}

/// Callback type for progress updates.
///
/// Invoked zero or more times while a command runs; the command's own
/// `Result` is the single terminal signal.
pub type ProgressCallback = Box<dyn Fn(FfmpegProgress) + Send + 'static>;

/// A callback that ignores every update.
pub fn noop_progress() -> ProgressCallback {
    Box::new(|_| {})
}
