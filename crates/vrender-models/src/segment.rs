//! Trim segments and submission validation errors.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum reasonable source position (24 hours in seconds).
pub const MAX_SEGMENT_SECS: f64 = 86400.0;

/// A `[start, end)` time range of the source to keep, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// Start time in seconds (inclusive)
    pub start: f64,
    /// End time in seconds (exclusive)
    pub end: f64,
}

impl Segment {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length of the segment in seconds.
    ///
    /// The transcoder is always driven with start + duration rather than
    /// start + end so every clip is cut from the same reference point.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Check `0 <= start < end` with finite values.
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(ValidationError::NonFiniteSegment { index });
        }
        if self.start < 0.0 {
            return Err(ValidationError::NegativeStart {
                index,
                start: self.start,
            });
        }
        if self.start >= self.end {
            return Err(ValidationError::InvertedSegment {
                index,
                start: self.start,
                end: self.end,
            });
        }
        if self.end > MAX_SEGMENT_SECS {
            return Err(ValidationError::SegmentTooLong {
                index,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// Validate an ordered segment list.
pub fn validate_segments(segments: &[Segment]) -> Result<(), ValidationError> {
    if segments.is_empty() {
        return Err(ValidationError::EmptySegments);
    }
    segments
        .iter()
        .enumerate()
        .try_for_each(|(index, segment)| segment.validate(index))
}

/// Sum of all segment durations, i.e. the expected output length.
pub fn total_duration(segments: &[Segment]) -> f64 {
    segments.iter().map(Segment::duration).sum()
}

/// Malformed submission. Rejected synchronously, no job is created.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("sourceUrl is required")]
    MissingSourceUrl,

    #[error("Invalid {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("At least one segment is required")]
    EmptySegments,

    #[error("Segment {index}: start and end must be finite numbers")]
    NonFiniteSegment { index: usize },

    #[error("Segment {index}: start ({start}) cannot be negative")]
    NegativeStart { index: usize, start: f64 },

    #[error("Segment {index}: start ({start}) must be before end ({end})")]
    InvertedSegment { index: usize, start: f64, end: f64 },

    #[error("Segment {index}: end ({end}) exceeds the maximum source length")]
    SegmentTooLong { index: usize, end: f64 },
}
