//! Joining segment clips with the concat demuxer.

use std::path::{Path, PathBuf};
use tokio::fs;
use vrender_models::EncodingConfig;

use crate::command::FfmpegCommand;
use crate::error::MediaResult;
use crate::filters::{build_title_filter, TitleStyle};

/// Optional overlays applied while concatenating.
#[derive(Debug, Clone, Default)]
pub struct ConcatOverlay {
    /// Replacement audio track
    pub audio: Option<PathBuf>,
    /// Burned-in title text
    pub title: Option<String>,
}

/// Render the concat demuxer manifest for `clips`, in order.
pub fn concat_manifest(clips: &[PathBuf]) -> String {
    let mut manifest = String::new();
    for clip in clips {
        // Single quotes close and reopen around an escaped quote
        let path = clip.to_string_lossy().replace('\'', r"'\''");
        manifest.push_str("file '");
        manifest.push_str(&path);
        manifest.push_str("'\n");
    }
    manifest
}

/// Write the concat manifest to `path`.
pub async fn write_concat_manifest(path: impl AsRef<Path>, clips: &[PathBuf]) -> MediaResult<()> {
    fs::write(path, concat_manifest(clips)).await?;
    Ok(())
}

/// Build the concat command.
///
/// Video is stream-copied unless a title is burned in, which needs a
/// re-encode. Overlay audio replaces the clips' own track and the output ends
/// with the shorter of the two.
pub fn build_concat_command(
    manifest: impl AsRef<Path>,
    output: impl AsRef<Path>,
    overlay: &ConcatOverlay,
    encoding: &EncodingConfig,
    title_style: &TitleStyle,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new(manifest, output).input_args(["-f", "concat", "-safe", "0"]);

    cmd = match &overlay.audio {
        Some(audio) => cmd.add_input(audio).map("0:v:0").map("1:a:0"),
        None => cmd.map("0:v:0").map("0:a?"),
    };

    cmd = match &overlay.title {
        Some(title) => cmd
            .video_filter(build_title_filter(title, title_style))
            .output_args(encoding.video_args()),
        None => cmd.video_codec("copy"),
    };

    cmd = if overlay.audio.is_some() {
        cmd.output_args(encoding.audio_args()).shortest()
    } else {
        cmd.audio_codec("copy")
    };

    cmd.faststart()
}
