//! Submission payloads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::segment::{validate_segments, Segment, ValidationError};

/// Optional overlay instructions for a render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Text burned into the output video
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Audio track that replaces the source audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl RenderOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    /// Drop blank values so downstream stages only see real overlays.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.filter(|t| !t.trim().is_empty()),
            audio_url: self
                .audio_url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
        }
    }
}

/// Body of `POST /render`.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl RenderRequest {
    /// Split into the arguments the job store expects.
    pub fn into_parts(self) -> (String, Vec<Segment>, RenderOptions) {
        let options = RenderOptions {
            title: self.title,
            audio_url: self.audio_url,
        };
        (self.source_url, self.segments, options)
    }
}

/// Response of `POST /render`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: String,
}

/// Validate a full submission.
pub fn validate_submission(
    source_url: &str,
    segments: &[Segment],
    options: &RenderOptions,
) -> Result<(), ValidationError> {
    if source_url.trim().is_empty() {
        return Err(ValidationError::MissingSourceUrl);
    }
    validate_fetch_url("sourceUrl", source_url)?;
    validate_segments(segments)?;
    if let Some(ref audio_url) = options.audio_url {
        validate_fetch_url("audioUrl", audio_url)?;
    }
    Ok(())
}

fn validate_fetch_url(field: &'static str, raw: &str) -> Result<(), ValidationError> {
    let parsed = Url::parse(raw.trim()).map_err(|e| ValidationError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ValidationError::InvalidUrl {
            field,
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}
