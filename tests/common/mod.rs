//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;

use smart_hedge::config::DispatcherConfig;
use smart_hedge::http::HttpServer;
use smart_hedge::lifecycle::Shutdown;

/// One scripted upstream reply.
#[derive(Clone)]
pub struct Step {
    pub delay: Duration,
    pub status: u16,
    pub body: String,
}

impl Step {
    pub fn ok(delay_ms: u64, time: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            status: 200,
            body: format!(r#"{{"time": {}}}"#, time),
        }
    }

    pub fn status(delay_ms: u64, status: u16) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            status,
            body: "error".into(),
        }
    }

    pub fn invalid_json(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            status: 200,
            body: "Not a valid JSON".into(),
        }
    }
}

#[derive(Clone)]
struct Script {
    steps: Arc<Vec<Step>>,
    hits: Arc<AtomicUsize>,
}

async fn scripted_reply(State(script): State<Script>) -> (StatusCode, String) {
    let call = script.hits.fetch_add(1, Ordering::SeqCst);
    let step = script.steps[call.min(script.steps.len() - 1)].clone();
    tokio::time::sleep(step.delay).await;
    let status = StatusCode::from_u16(step.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, step.body)
}

/// Start a mock upstream replying to the n-th call with `steps[n]` (the last
/// step repeats). Returns its address and a call counter.
pub async fn start_scripted_backend(steps: Vec<Step>) -> (SocketAddr, Arc<AtomicUsize>) {
    assert!(!steps.is_empty());
    let hits = Arc::new(AtomicUsize::new(0));
    let script = Script {
        steps: Arc::new(steps),
        hits: hits.clone(),
    };

    let app = Router::new().route("/", get(scripted_reply)).with_state(script);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, hits)
}

/// An address with nothing listening on it.
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Default test config pointed at `upstream`.
pub fn config_for(upstream: SocketAddr) -> DispatcherConfig {
    let mut config = DispatcherConfig::default();
    config.upstream.url = format!("http://{}/", upstream);
    config
}

/// Start the dispatcher on an ephemeral port.
pub async fn start_dispatcher(config: DispatcherConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
