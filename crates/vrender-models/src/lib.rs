//! Shared data models for the render-job engine.
//!
//! This crate provides Serde-serializable types for:
//! - Render jobs, their ids and lifecycle status
//! - Trim segments and overlay options
//! - Submission requests and their validation
//! - Encoding configuration for intermediate clips

pub mod encoding;
pub mod job;
pub mod request;
pub mod segment;

// Re-export common types
pub use encoding::EncodingConfig;
pub use job::{JobId, JobStatus, JobStatusView, RenderJob};
pub use request::{validate_submission, RenderOptions, RenderRequest, SubmitResponse};
pub use segment::{total_duration, validate_segments, Segment, ValidationError};
