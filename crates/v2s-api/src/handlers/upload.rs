//! Video upload.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use v2s_models::ProcessParams;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use crate::validation::validate_upload;

/// Multipart field carrying the video.
const VIDEO_FIELD: &str = "video";

/// Upload response.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub job_id: String,
    /// Locator of the stored video
    pub preview: String,
}

/// POST /api/upload
///
/// Accepts a multipart form with a `video` field. The file must be named
/// `*.mp4` and sniff as MP4; anything else is rejected before a job exists.
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        upload = Some((file_name, data));
    }

    let (file_name, data) =
        upload.ok_or_else(|| ApiError::bad_request("Missing required 'video' field"))?;

    if let Err(e) = validate_upload(&file_name, &data) {
        metrics::record_upload_rejected();
        return Err(e);
    }

    let job = state
        .store
        .create(&file_name, &data, ProcessParams::default())
        .await?;
    metrics::record_upload(data.len());
    info!(job_id = %job.id, bytes = data.len(), "Video uploaded");

    Ok(Json(UploadResponse {
        preview: job.preview_locator(),
        job_id: job.id.to_string(),
    }))
}
