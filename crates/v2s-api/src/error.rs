//! API error types.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use v2s_jobs::JobError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Job(#[from] JobError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unsupported_media_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedMediaType(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Job(e) => match e {
                JobError::NotFound(_) => StatusCode::NOT_FOUND,
                JobError::AlreadyRunning(_) => StatusCode::CONFLICT,
                JobError::InvalidParams(_) => StatusCode::BAD_REQUEST,
                JobError::Stage { .. } | JobError::Io(_) | JobError::Json(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Errors whose message may leak host details.
    fn is_internal(&self) -> bool {
        matches!(
            self,
            ApiError::Internal(_)
                | ApiError::Job(JobError::Io(_))
                | ApiError::Job(JobError::Json(_))
        )
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::bad_request(e.body_text())
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

/// Response extension marking a `detail` that may expose host internals.
///
/// Stage failures are not marked; their diagnostics are meant for the client.
#[derive(Debug, Clone, Copy)]
pub struct InternalDetail;

/// Detail shown in place of a marked one when redaction is on.
pub const REDACTED_DETAIL: &str = "An internal error occurred";

/// Error body with the generic detail.
pub(crate) fn redacted(status: StatusCode) -> Response {
    let body = ErrorResponse {
        detail: REDACTED_DETAIL.to_string(),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let internal = self.is_internal();

        let mut response = (status, Json(ErrorResponse { detail: self.to_string() })).into_response();
        if internal {
            response.extensions_mut().insert(InternalDetail);
        }
        response
    }
}
