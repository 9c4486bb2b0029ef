//! Status push over a live WebSocket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use v2s_api::{create_router, ApiConfig, AppState};
use v2s_media::testing::ScriptedRunner;
use v2s_models::{JobStatus, ProcessParams, StepName, StepState};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const PUSH_INTERVAL: Duration = Duration::from_millis(50);
const WAIT: Duration = Duration::from_secs(5);

async fn serve() -> (TempDir, AppState, SocketAddr) {
    let dir = TempDir::new().unwrap();
    let mut config = ApiConfig::default();
    config.jobs.outputs_dir = dir.path().to_path_buf();
    config.status_push_interval = PUSH_INTERVAL;

    let state = AppState::new(config, Arc::new(ScriptedRunner::new()));
    let router = create_router(state.clone(), None);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (dir, state, addr)
}

async fn subscribe(addr: SocketAddr, job_id: &str) -> Socket {
    let url = format!("ws://{addr}/ws/status?job_id={job_id}");
    let (socket, _) = connect_async(url).await.unwrap();
    socket
}

async fn next_message(socket: &mut Socket) -> Message {
    timeout(WAIT, socket.next())
        .await
        .expect("no message before timeout")
        .expect("socket ended")
        .unwrap()
}

async fn next_status(socket: &mut Socket) -> JobStatus {
    match next_message(socket).await {
        Message::Text(json) => serde_json::from_str(&json).unwrap(),
        other => panic!("expected a status snapshot, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pushes_full_snapshot_every_tick() {
    let (_dir, state, addr) = serve().await;
    let job = state
        .store
        .create("clip.mp4", b"video", ProcessParams::default())
        .await
        .unwrap();

    let mut socket = subscribe(addr, job.id.as_str()).await;

    // Nothing changes between ticks, so the same document repeats.
    for _ in 0..3 {
        assert_eq!(next_status(&mut socket).await, job.status);
    }

    state
        .store
        .set_step(&job.id, StepName::ExtractFrames, StepState::Running)
        .await
        .unwrap();

    let mut seen_running = false;
    for _ in 0..20 {
        let status = next_status(&mut socket).await;
        assert_eq!(status.job_id, job.id);
        assert_eq!(status.steps.len(), 4);
        if status.step(StepName::ExtractFrames) == StepState::Running {
            assert_eq!(status.current_step, "extract_frames");
            seen_running = true;
            break;
        }
    }
    assert!(seen_running);
}

#[tokio::test]
async fn test_closes_normally_once_job_is_gone() {
    let (_dir, state, addr) = serve().await;
    let job = state
        .store
        .create("clip.mp4", b"video", ProcessParams::default())
        .await
        .unwrap();

    let mut socket = subscribe(addr, job.id.as_str()).await;
    next_status(&mut socket).await;

    assert!(state.store.evict_if_idle(&job.id).await);

    let frame = loop {
        match next_message(&mut socket).await {
            Message::Text(_) => continue,
            Message::Close(frame) => break frame.expect("close frame without payload"),
            other => panic!("unexpected message: {other:?}"),
        }
    };
    assert_eq!(frame.code, CloseCode::Normal);
    assert_eq!(frame.reason, "job not found");
}

#[tokio::test]
async fn test_unknown_job_closes_immediately() {
    let (_dir, _state, addr) = serve().await;

    let mut socket = subscribe(addr, "job_missing").await;

    match next_message(&mut socket).await {
        Message::Close(Some(frame)) => {
            assert_eq!(frame.code, CloseCode::Normal);
            assert_eq!(frame.reason, "job not found");
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn test_subscription_requires_job_id() {
    let (_dir, _state, addr) = serve().await;

    let err = connect_async(format!("ws://{addr}/ws/status"))
        .await
        .unwrap_err();

    match err {
        tungstenite::Error::Http(response) => assert_eq!(response.status(), 400),
        other => panic!("unexpected error: {other}"),
    }
}
