//! Pipeline trigger.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::error;
use v2s_models::{JobId, JobStatus, ProcessParams};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Process request.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub job_id: String,
    #[serde(flatten)]
    pub params: ProcessParams,
}

/// POST /api/process
///
/// Runs the whole pipeline for a job and answers with its final status. The
/// run happens on its own task, so it finishes even if the client hangs up.
pub async fn process_job(
    State(state): State<AppState>,
    body: Result<Json<ProcessRequest>, JsonRejection>,
) -> ApiResult<Json<JobStatus>> {
    let Json(request) = body.map_err(|e| {
        ApiError::bad_request(format!("Invalid request body: {}", e.body_text()))
    })?;
    let id = JobId::parse(&request.job_id).ok_or_else(|| ApiError::not_found("Job not found"))?;

    let pipeline = state.pipeline.clone();
    let run = tokio::spawn(async move { pipeline.run(&id, request.params).await });

    let status = run.await.map_err(|e| {
        error!("Pipeline task failed: {}", e);
        ApiError::internal("Processing task aborted")
    })??;

    Ok(Json(status))
}
