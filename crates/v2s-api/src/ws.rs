//! Status push over WebSocket.
//!
//! Every tick the subscriber gets the job's complete status document. There
//! is no diffing, so clients must tolerate identical consecutive payloads.
//! When the job is unknown (never existed, or removed by retention) the
//! socket is closed normally with reason `job not found`.

use std::sync::atomic::{AtomicI64, Ordering};

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::time::interval;
use tracing::{debug, warn};
use v2s_jobs::JobStore;
use v2s_models::JobId;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Close reason sent when the job is unknown.
pub const JOB_NOT_FOUND_REASON: &str = "job not found";

const ENDPOINT: &str = "status";

/// Global counter for active WebSocket connections.
static ACTIVE_WS_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

/// Status subscription query.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub job_id: Option<String>,
}

/// GET /ws/status?job_id=...
pub async fn ws_status(
    Query(query): Query<StatusQuery>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    let job_id = query
        .job_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing job_id"))?;

    let count = ACTIVE_WS_CONNECTIONS.fetch_add(1, Ordering::SeqCst) + 1;
    metrics::set_ws_active_connections(count);
    metrics::record_ws_connection(ENDPOINT);

    Ok(ws
        .on_upgrade(move |socket| async move {
            handle_status_socket(socket, state, job_id).await;
            let count = ACTIVE_WS_CONNECTIONS.fetch_sub(1, Ordering::SeqCst) - 1;
            metrics::set_ws_active_connections(count);
        })
        .into_response())
}

/// Push snapshots until the job disappears, a send fails or the client
/// closes.
async fn handle_status_socket(socket: WebSocket, state: AppState, job_id: String) {
    let (mut sender, mut receiver) = socket.split();
    let mut ticker = interval(state.status_push_interval());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let message = status_message(&state.store, &job_id).await;
                let closing = matches!(message, Message::Close(_));
                let kind = if closing { "close" } else { "status" };

                if let Err(e) = sender.send(message).await {
                    debug!(job_id = %job_id, "Status subscriber gone: {}", e);
                    break;
                }
                metrics::record_ws_message_sent(ENDPOINT, kind);
                if closing {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Next frame for a subscriber: the status document, or a normal close when
/// the job is unknown.
pub async fn status_message(store: &JobStore, job_id: &str) -> Message {
    let status = match JobId::parse(job_id) {
        Some(id) => store.status(&id).await,
        None => None,
    };

    match status {
        Some(status) => match serde_json::to_string(&status) {
            Ok(json) => Message::Text(json),
            Err(e) => {
                warn!(job_id = %job_id, "Failed to serialize status: {}", e);
                close(close_code::ERROR, "status unavailable")
            }
        },
        None => close(close_code::NORMAL, JOB_NOT_FOUND_REASON),
    }
}

fn close(code: u16, reason: &'static str) -> Message {
    Message::Close(Some(CloseFrame {
        code,
        reason: reason.into(),
    }))
}
