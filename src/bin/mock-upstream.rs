//! Scriptable stand-in for the upstream work endpoint.
//!
//! - `GET /` answers from the queued scenario, or randomly when none is queued
//! - `GET /requests` lists arrival offsets (seconds) since the last reset
//! - `POST /setscenario` queues `[body, status, delay_ms]` steps and resets the log

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use smart_hedge::lifecycle::shutdown_signal;
use smart_hedge::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "mock-upstream")]
#[command(about = "Mock upstream for exercising the smart dispatcher", long_about = None)]
struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    #[arg(long, default_value = "info")]
    log_level: String,
}

/// One scripted reply: `[body, status, delay_ms]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScenarioStep(String, u16, f64);

#[derive(Debug)]
struct MockState {
    scenario: Vec<ScenarioStep>,
    requests: Vec<f64>,
    started: Instant,
}

impl MockState {
    fn reset(&mut self, scenario: Vec<ScenarioStep>) {
        self.scenario = scenario;
        self.requests.clear();
        self.started = Instant::now();
    }

    /// Log the arrival and pick the reply for it.
    fn next_reply(&mut self) -> ScenarioStep {
        let ordinal = self.requests.len();
        self.requests.push(self.started.elapsed().as_secs_f64());
        match self.scenario.get(ordinal) {
            Some(step) => step.clone(),
            None => random_reply(),
        }
    }
}

type SharedState = Arc<Mutex<MockState>>;

fn random_reply() -> ScenarioStep {
    let mut rng = rand::thread_rng();
    let delay = rng.gen_range(100..=600) as f64;
    match rng.gen_range(0..=10) {
        10 => ScenarioStep(String::new(), 0, 10_000.0),
        9 => ScenarioStep("Not a valid JSON".into(), 200, delay),
        8 => ScenarioStep("Not a valid JSON".into(), 500, delay),
        _ => ScenarioStep(format!(r#"{{"time": {}}}"#, delay as u64), 200, delay),
    }
}

/// Sleep before replying. `None` when the value is not a representable duration.
fn reply_delay(delay_ms: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(delay_ms.max(0.0) / 1000.0).ok()
}

async fn handle_work(State(state): State<SharedState>) -> Response {
    let (reply, uptime) = {
        let mut state = match state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        (state.next_reply(), state.started.elapsed())
    };
    let ScenarioStep(body, status, delay_ms) = reply;

    tracing::info!(
        status,
        uptime_secs = uptime.as_secs_f64(),
        delay_ms,
        body = %body,
        "Serving work request"
    );
    let Some(delay) = reply_delay(delay_ms) else {
        tracing::warn!(delay_ms, "Scenario delay out of range");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    tokio::time::sleep(delay).await;

    if status == 200 {
        ([(header::CONTENT_TYPE, "application/json")], body).into_response()
    } else {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

async fn handle_requests(State(state): State<SharedState>) -> Json<Vec<f64>> {
    let requests = match state.lock() {
        Ok(guard) => guard.requests.clone(),
        Err(poisoned) => poisoned.into_inner().requests.clone(),
    };
    Json(requests)
}

async fn handle_scenario(
    State(state): State<SharedState>,
    Json(scenario): Json<Vec<ScenarioStep>>,
) -> &'static str {
    tracing::info!(steps = scenario.len(), "Scenario set");
    match state.lock() {
        Ok(mut guard) => guard.reset(scenario),
        Err(poisoned) => poisoned.into_inner().reset(scenario),
    }
    "OK"
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handle_work))
        .route("/requests", get(handle_requests))
        .route("/setscenario", post(handle_scenario))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    let state = Arc::new(Mutex::new(MockState {
        scenario: Vec::new(),
        requests: Vec::new(),
        started: Instant::now(),
    }));

    let listener = TcpListener::bind(format!("{}:{}", cli.host, cli.port)).await?;
    tracing::info!(address = %listener.local_addr()?, "Mock upstream listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
