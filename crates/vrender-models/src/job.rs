//! Render job definitions.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::request::RenderOptions;
use crate::segment::Segment;

/// Unique identifier for a render job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for the worker
    #[default]
    Queued,
    /// Claimed by the worker, pipeline running
    Processing,
    /// Output published, `final_url` set
    Completed,
    /// A stage failed, `error` set
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Terminal statuses never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// `queued -> processing -> completed | error`. Staying in the same
    /// non-terminal status is allowed (progress updates).
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Queued, JobStatus::Queued | JobStatus::Processing) => true,
            (JobStatus::Processing, JobStatus::Processing) => true,
            (JobStatus::Processing, JobStatus::Completed | JobStatus::Error) => true,
            // A claim can fail before the first stage starts.
            (JobStatus::Queued, JobStatus::Error) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request to turn one source video into a trimmed, annotated output.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderJob {
    /// Unique job ID
    pub id: JobId,

    /// Input media reference (fetched, never embedded)
    pub source_url: String,

    /// Ranges to keep, in output order
    pub segments: Vec<Segment>,

    /// Title / audio overlays
    #[serde(default)]
    pub options: RenderOptions,

    /// Lifecycle status
    #[serde(default)]
    pub status: JobStatus,

    /// Progress (0-100)
    #[serde(default)]
    pub progress: u8,

    /// Public URL of the published output (completed only)
    pub final_url: Option<String>,

    /// Human-readable failure message (error only)
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl RenderJob {
    /// Create a new queued job. Inputs are assumed validated.
    pub fn new(
        source_url: impl Into<String>,
        segments: Vec<Segment>,
        options: RenderOptions,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            source_url: source_url.into(),
            segments,
            options,
            status: JobStatus::Queued,
            progress: 0,
            final_url: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Client-facing snapshot.
    pub fn view(&self) -> JobStatusView {
        JobStatusView {
            job_id: self.id.to_string(),
            status: self.status,
            progress: self.progress,
            final_url: self.final_url.clone(),
            error: self.error.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Response of `GET /render/{jobId}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub final_url: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
