//! Render job submission and status.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;
use vrender_models::{JobId, JobStatusView, RenderRequest, SubmitResponse};
use vrender_queue::QueueCounts;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Submit a render job.
///
/// The job is queued and the worker nudged; rendering happens in the
/// background and is observed through the status endpoint.
pub async fn submit_render(
    State(state): State<AppState>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let (source_url, segments, options) = request.into_parts();
    let segment_count = segments.len();
    let job_id = state.jobs.create(source_url, segments, options)?;

    metrics::record_job_submitted();
    info!(job_id = %job_id, segments = segment_count, "Render job queued");

    state.worker.try_advance();

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id: job_id.to_string(),
        }),
    ))
}

/// Current status of a render job.
pub async fn get_render_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusView>> {
    let job = state.jobs.get(&JobId::from_string(job_id))?;
    Ok(Json(job.view()))
}

/// Queue overview response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatusResponse {
    #[serde(flatten)]
    pub counts: QueueCounts,
    pub in_flight: Option<String>,
    pub worker_running: bool,
}

/// Counts per status plus the job currently rendering.
pub async fn queue_status(State(state): State<AppState>) -> Json<QueueStatusResponse> {
    Json(QueueStatusResponse {
        counts: state.jobs.counts(),
        in_flight: state.jobs.in_flight().map(|id| id.to_string()),
        worker_running: state.worker.is_running(),
    })
}
