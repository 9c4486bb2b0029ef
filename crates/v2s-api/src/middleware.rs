//! API middleware.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Method, Request, Response};
use axum::middleware::Next;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Span};
use uuid::Uuid;

use crate::error::{redacted, InternalDetail};

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// CORS for the web client.
///
/// `Range` is allowed and the range headers are exposed so a cross-origin
/// player can seek in the preview.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let exposed = [
        header::CONTENT_LENGTH,
        header::CONTENT_TYPE,
        header::CONTENT_RANGE,
        header::ACCEPT_RANGES,
        REQUEST_ID,
    ];
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .expose_headers(exposed)
        .max_age(Duration::from_secs(600));

    if origins.iter().any(|o| o == "*") {
        layer.allow_headers(Any).allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::RANGE])
            .allow_origin(origins)
    }
}

/// Tag every request with an `X-Request-ID`, reusing the caller's if sent.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response<Body> {
    let request_id = request
        .headers()
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(request_id.clone());
    Span::current().record("request_id", &request_id);

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID, value);
    }
    response
}

/// Log one line per request. Health probes are skipped.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    if uri.path() != "/health" {
        info!(
            method = %method,
            uri = %uri,
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
    }
    response
}

/// Swap the body of responses marked [`InternalDetail`] for a generic one.
///
/// Installed only in production.
pub async fn redact_internal_errors(request: Request<Body>, next: Next) -> Response<Body> {
    let response = next.run(request).await;
    if response.extensions().get::<InternalDetail>().is_some() {
        return redacted(response.status());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{middleware, Router};
    use tower::ServiceExt;
    use v2s_jobs::{JobError, Stage};
    use v2s_media::MediaError;

    use crate::error::{ApiError, REDACTED_DETAIL};

    fn redacting_router() -> Router {
        Router::new()
            .route(
                "/internal",
                get(|| async { ApiError::internal("disk full at /var/lib/v2s") }),
            )
            .route(
                "/stage",
                get(|| async {
                    ApiError::from(JobError::stage(
                        Stage::Gif,
                        MediaError::ffmpeg_failed("exit status: 1", "palette error", Some(1)),
                    ))
                }),
            )
            .layer(middleware::from_fn(redact_internal_errors))
    }

    async fn detail(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        (status, body["detail"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_internal_details_are_redacted() {
        let (status, detail) = detail(redacting_router(), "/internal").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(detail, REDACTED_DETAIL);
    }

    #[tokio::test]
    async fn test_stage_diagnostics_survive_redaction() {
        let (status, detail) = detail(redacting_router(), "/stage").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(detail.starts_with("Failed to create GIF"));
        assert!(detail.contains("palette error"));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let router = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn(request_id));

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(&REQUEST_ID, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[&REQUEST_ID], "req-42");
    }
}
