#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper and media helpers for the render pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Per-invocation timeouts
//! - HTTP fetch of source and overlay media
//! - Segment cutting, concat manifests and title/audio overlays
//! - Best-effort temp file cleanup
//! - The `Transcoder` seam the worker drives

pub mod cleanup;
pub mod command;
pub mod concat;
pub mod download;
pub mod error;
pub mod filters;
pub mod media_info;
pub mod progress;
pub mod segment;
pub mod transcoder;

pub use cleanup::{remove_paths, CleanupWarning};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{build_concat_command, write_concat_manifest, ConcatOverlay};
pub use download::{extension_from_url, HttpFetcher};
pub use error::{MediaError, MediaResult};
pub use filters::{build_title_filter, escape_drawtext_text, TitleStyle};
pub use media_info::{read_video_info, VideoInfo};
pub use progress::{FfmpegProgress, ProgressCallback};
pub use segment::build_cut_command;
pub use transcoder::{FfmpegTranscoder, Transcoder};
