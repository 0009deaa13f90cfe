//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hedge_requests_total` (counter): finished races by outcome
//! - `hedge_request_duration_seconds` (histogram): race wall time by outcome
//! - `hedge_attempts_total` (counter): worker attempts by result
//! - `hedge_admission_rejected_total` (counter): 429 responses
//! - `hedge_in_flight` (gauge): admitted, unfinished requests

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    ::metrics::describe_counter!("hedge_requests_total", "Finished races by outcome");
    ::metrics::describe_histogram!(
        "hedge_request_duration_seconds",
        ::metrics::Unit::Seconds,
        "Race wall time by outcome"
    );
    ::metrics::describe_counter!("hedge_attempts_total", "Upstream attempts by result");
    ::metrics::describe_counter!("hedge_admission_rejected_total", "Requests refused by admission");
    ::metrics::describe_gauge!("hedge_in_flight", "Admitted requests not yet answered");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished race.
pub fn record_race(outcome: &'static str, start: Instant) {
    ::metrics::counter!("hedge_requests_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("hedge_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record one worker attempt (`success`, `failure` or `skipped`).
pub fn record_attempt(result: &'static str) {
    ::metrics::counter!("hedge_attempts_total", "result" => result).increment(1);
}

pub fn record_admission_rejected() {
    ::metrics::counter!("hedge_admission_rejected_total").increment(1);
}

pub fn set_in_flight(count: usize) {
    ::metrics::gauge!("hedge_in_flight").set(count as f64);
}
