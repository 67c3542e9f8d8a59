//! The transcoder seam driven by the render pipeline.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use vrender_models::{EncodingConfig, Segment};

use crate::command::{check_ffmpeg, check_ffprobe, FfmpegRunner};
use crate::concat::{build_concat_command, ConcatOverlay};
use crate::error::MediaResult;
use crate::filters::TitleStyle;
use crate::media_info::{read_video_info, VideoInfo};
use crate::progress::ProgressCallback;
use crate::segment::build_cut_command;

/// Default timeout for one ffmpeg invocation.
pub const DEFAULT_FFMPEG_TIMEOUT_SECS: u64 = 600;

/// Media operations the pipeline needs from an external transcoder.
///
/// Each call resolves once: progress updates arrive through the callback
/// while it runs and the returned `Result` is the terminal signal.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Re-encode `segment` of `source` into `output`.
    async fn cut_segment(
        &self,
        source: &Path,
        segment: &Segment,
        output: &Path,
        progress: ProgressCallback,
    ) -> MediaResult<()>;

    /// Join the clips listed in `manifest` into `output`, applying overlays.
    async fn concat(
        &self,
        manifest: &Path,
        overlay: &ConcatOverlay,
        output: &Path,
        progress: ProgressCallback,
    ) -> MediaResult<()>;

    /// Stream and container details of a media file.
    async fn inspect(&self, path: &Path) -> MediaResult<VideoInfo>;
}

/// `Transcoder` backed by the ffmpeg and ffprobe binaries.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    runner: FfmpegRunner,
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    encoding: EncodingConfig,
    title_style: TitleStyle,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe", DEFAULT_FFMPEG_TIMEOUT_SECS)
    }
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        let ffmpeg = ffmpeg.into();
        Self {
            runner: FfmpegRunner::new()
                .with_binary(ffmpeg.clone())
                .with_timeout(timeout_secs),
            ffmpeg,
            ffprobe: ffprobe.into(),
            encoding: EncodingConfig::default(),
            title_style: TitleStyle::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_title_style(mut self, style: TitleStyle) -> Self {
        self.title_style = style;
        self
    }

    /// Resolve both binaries, returning the ffmpeg path.
    pub fn check_available(&self) -> MediaResult<PathBuf> {
        check_ffprobe(&self.ffprobe)?;
        check_ffmpeg(&self.ffmpeg)
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn cut_segment(
        &self,
        source: &Path,
        segment: &Segment,
        output: &Path,
        progress: ProgressCallback,
    ) -> MediaResult<()> {
        debug!(
            "Cutting {:.3}s..{:.3}s of {} -> {}",
            segment.start,
            segment.end,
            source.display(),
            output.display()
        );
        let cmd = build_cut_command(source, output, segment, &self.encoding);
        self.runner.run_with_progress(&cmd, progress).await
    }

    async fn concat(
        &self,
        manifest: &Path,
        overlay: &ConcatOverlay,
        output: &Path,
        progress: ProgressCallback,
    ) -> MediaResult<()> {
        let cmd =
            build_concat_command(manifest, output, overlay, &self.encoding, &self.title_style);
        self.runner.run_with_progress(&cmd, progress).await
    }

    async fn inspect(&self, path: &Path) -> MediaResult<VideoInfo> {
        read_video_info(&self.ffprobe, path).await
    }
}
