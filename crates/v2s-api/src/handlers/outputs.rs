//! Artifact retrieval from job directories.
//!
//! Files are streamed by [`ServeDir`], which picks the content type from the
//! extension, rejects `..` segments and answers `Range` requests so the
//! uploaded preview can seek. Only paths whose first segment is a job id get
//! that far.

use std::path::Path;

use axum::body::Body;
use axum::http::{header, HeaderValue, Request};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use v2s_jobs::OUTPUTS_ROUTE;
use v2s_models::JobId;

use crate::error::ApiError;
use crate::state::AppState;

/// Router serving `GET /outputs/:job_id/*file`.
pub fn outputs_router(root: &Path) -> Router<AppState> {
    // Directories are never listed or redirected; they simply 404.
    let files = ServeDir::new(root).append_index_html_on_directories(false);

    Router::new()
        .nest_service(OUTPUTS_ROUTE, files)
        // Artifacts are rewritten in place by every run.
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(middleware::from_fn(require_job_path))
}

async fn require_job_path(request: Request<Body>, next: Next) -> Response {
    match job_segment(request.uri().path()) {
        Some(id) if JobId::is_valid(id) => next.run(request).await,
        _ => ApiError::not_found("File not found").into_response(),
    }
}

/// First path segment below the outputs route.
fn job_segment(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(OUTPUTS_ROUTE).unwrap_or(path);
    rest.strip_prefix('/')?.split('/').next()
}
