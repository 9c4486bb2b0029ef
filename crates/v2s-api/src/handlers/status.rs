//! On-demand job status.

use axum::extract::{Path, State};
use axum::Json;
use v2s_models::{JobId, JobStatus};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Current status of a job.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatus>> {
    let id = JobId::parse(&job_id).ok_or_else(|| ApiError::not_found("Job not found"))?;

    state
        .store
        .status(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Job not found"))
}
