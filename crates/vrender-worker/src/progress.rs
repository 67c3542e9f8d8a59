//! Mapping stage progress onto the job's 0-100 scale.

use std::sync::Arc;
use vrender_media::{FfmpegProgress, ProgressCallback};
use vrender_models::JobId;
use vrender_queue::{JobStore, JobUpdate};

/// Progress after the source is fetched.
pub const SOURCE_FETCHED: u8 = 10;
/// Progress after overlay audio is fetched; segment cutting starts here.
pub const AUDIO_FETCHED: u8 = 30;
/// Progress when every segment is cut.
pub const SEGMENTS_CUT: u8 = 60;
/// Progress after concatenation.
pub const CONCATENATED: u8 = 80;

/// Writes a job's progress to the store.
///
/// The store keeps progress monotonic, so reporters never need to track
/// what was written before.
#[derive(Clone)]
pub struct ProgressReporter {
    store: Arc<JobStore>,
    job_id: JobId,
}

impl ProgressReporter {
    pub fn new(store: Arc<JobStore>, job_id: JobId) -> Self {
        Self { store, job_id }
    }

    /// Record a checkpoint.
    pub fn set(&self, progress: u8) {
        self.store.update(&self.job_id, JobUpdate::progress(progress));
    }

    /// Callback that moves progress through `[from, to]` as ffmpeg encodes
    /// `expected_secs` of output.
    pub fn span(&self, from: u8, to: u8, expected_secs: f64) -> ProgressCallback {
        let reporter = self.clone();
        Box::new(move |p: FfmpegProgress| {
            reporter.set(interpolate(from, to, p.fraction_of(expected_secs)));
        })
    }
}

/// Point `fraction` of the way from `from` to `to`, never past `to`.
pub fn interpolate(from: u8, to: u8, fraction: f64) -> u8 {
    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    let span = f64::from(to.saturating_sub(from));
    from.saturating_add((span * fraction).floor() as u8).min(to)
}

/// Span of segment `index` out of `count` within `[AUDIO_FETCHED, SEGMENTS_CUT]`.
pub fn segment_span(index: usize, count: usize) -> (u8, u8) {
    let count = count.max(1);
    let width = f64::from(SEGMENTS_CUT - AUDIO_FETCHED);
    let at = |i: usize| AUDIO_FETCHED + ((width * i as f64) / count as f64).round() as u8;
    (at(index), at(index + 1))
}
