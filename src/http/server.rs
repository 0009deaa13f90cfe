//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing)
//! - Admit or reject each `/api/smart` request
//! - Hand admitted requests to the hedge dispatcher and render the outcome
//! - Serve until the shutdown signal, then drain

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Path, RawQuery, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use url::Url;

use crate::config::{ConfigError, DispatcherConfig};
use crate::hedge::{HedgeDispatcher, HedgePolicy};
use crate::http::request::{parse_timeout, request_id, timeout_param, MakeRequestUuidV4};
use crate::http::response;
use crate::observability::metrics;
use crate::security::AdmissionGate;
use crate::upstream::HttpUpstream;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<HedgeDispatcher<HttpUpstream>>,
    pub admission: Arc<AdmissionGate>,
}

impl AppState {
    pub fn from_config(config: &DispatcherConfig) -> Result<Self, ConfigError> {
        let url = Url::parse(&config.upstream.url)?;
        let upstream = HttpUpstream::new(url);
        let policy = HedgePolicy::from(&config.hedging);

        Ok(Self {
            dispatcher: Arc::new(HedgeDispatcher::new(upstream, policy)),
            admission: Arc::new(AdmissionGate::new(config.admission.max_in_flight)),
        })
    }
}

/// HTTP server for the hedging dispatcher.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: DispatcherConfig) -> Result<Self, ConfigError> {
        let state = AppState::from_config(&config)?;

        tracing::info!(
            upstream = %config.upstream.url,
            fan_out = state.dispatcher.policy().fan_out,
            stagger_ms = config.hedging.stagger_ms,
            default_timeout_ms = config.hedging.default_timeout_ms,
            max_in_flight = config.admission.max_in_flight,
            "Remote service configured"
        );

        let router = build_router(state);
        Ok(Self { router })
    }

    /// Run the server until `shutdown` fires, then wait for in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/smart", get(smart_handler))
        .route("/api/smart/{timeout}", get(smart_path_handler))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        request_id = %request_id(request),
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

async fn smart_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Response {
    let timeout = timeout_param(query.as_deref());
    run_race(&state, timeout.as_deref()).await
}

/// Path form: `/api/smart/{timeout}`. Takes precedence over the query string.
async fn smart_path_handler(
    State(state): State<AppState>,
    Path(timeout): Path<String>,
) -> Response {
    run_race(&state, Some(&timeout)).await
}

async fn not_found_handler() -> Response {
    response::not_found()
}

async fn run_race(state: &AppState, raw_timeout: Option<&str>) -> Response {
    let Some(permit) = state.admission.try_admit() else {
        tracing::warn!(
            in_flight = state.admission.in_flight(),
            max_in_flight = state.admission.max_in_flight(),
            "Too many requests in flight, rejecting"
        );
        metrics::record_admission_rejected();
        return response::too_many_requests();
    };
    metrics::set_in_flight(state.admission.in_flight());

    let start = Instant::now();
    let outcome = state.dispatcher.dispatch(parse_timeout(raw_timeout)).await;
    metrics::record_race(outcome.label(), start);

    drop(permit);
    metrics::set_in_flight(state.admission.in_flight());

    outcome.into_response()
}
