//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{get_job_status, health, outputs_router, process_job, upload_video};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, redact_internal_errors, request_id, request_logging};
use crate::state::AppState;
use crate::ws::ws_status;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let api_routes = Router::new()
        .route("/upload", post(upload_video))
        .route("/process", post(process_job))
        .route("/jobs/:job_id/status", get(get_job_status));

    let ws_routes = Router::new().route("/ws/status", get(ws_status));

    let output_routes = outputs_router(state.store.root());

    let health_routes = Router::new().route("/health", get(health));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    let max_body_size = state.config.max_body_size;

    let mut routes = Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .merge(output_routes)
        .merge(health_routes)
        .merge(metrics_routes);
    if state.config.is_production() {
        routes = routes.layer(middleware::from_fn(redact_internal_errors));
    }

    routes
        // Uploads are buffered in memory, so both the extractor limit and
        // the transport limit follow the configured size.
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
