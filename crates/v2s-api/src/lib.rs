//! Axum HTTP API server.
//!
//! This crate provides:
//! - Video upload with MP4 validation
//! - A synchronous processing trigger returning the final job status
//! - Job status on demand and as a WebSocket push
//! - Artifact retrieval from job directories
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod validation;
pub mod ws;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
