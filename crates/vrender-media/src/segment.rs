//! Cutting one segment out of a source file.

use std::path::Path;
use vrender_models::{EncodingConfig, Segment};

use crate::command::FfmpegCommand;

/// Build the command that re-encodes `[start, start + duration)` of `source`.
///
/// Seeking uses explicit start and duration rather than start/end, and every
/// clip gets the same encoder settings so the clips can be joined by the
/// concat demuxer with stream copy.
pub fn build_cut_command(
    source: impl AsRef<Path>,
    output: impl AsRef<Path>,
    segment: &Segment,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    FfmpegCommand::new(source, output)
        .seek(segment.start)
        .duration(segment.duration())
        .map("0:v:0")
        .map("0:a:0?")
        .output_args(encoding.to_ffmpeg_args())
        .output_args(["-avoid_negative_ts", "make_zero"])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        let idx = args.iter().position(|a| a == flag).unwrap();
        &args[idx + 1]
    }

    #[test]
    fn test_cut_uses_start_and_duration() {
        let cmd = build_cut_command(
            "/scratch/j/source.mp4",
            "/scratch/j/segment_001.mp4",
            &Segment::new(5.0, 7.5),
            &EncodingConfig::default(),
        );
        let args = cmd.build_args();

        assert_eq!(value_after(&args, "-ss"), "5.000");
        assert_eq!(value_after(&args, "-t"), "2.500");
        assert!(!args.contains(&"-to".to_string()));
        assert_eq!(value_after(&args, "-c:v"), "libx264");
        assert_eq!(value_after(&args, "-c:a"), "aac");
        assert_eq!(args.last().unwrap(), "/scratch/j/segment_001.mp4");
    }

    #[test]
    fn test_cut_encoding_is_identical_across_segments() {
        let encoding = EncodingConfig::default();
        let first = Segment::new(0.0, 2.0);
        let second = Segment::new(5.0, 7.0);
        let a = build_cut_command("s.mp4", "a.mp4", &first, &encoding).build_args();
        let b = build_cut_command("s.mp4", "b.mp4", &second, &encoding).build_args();

        let tail = |args: &[String]| {
            let i = args.iter().position(|x| x == "-c:v").unwrap();
            args[i..args.len() - 1].to_vec()
        };
        assert_eq!(tail(&a), tail(&b));
    }
}
