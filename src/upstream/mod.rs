//! Upstream client subsystem.
//!
//! # Data Flow
//! ```text
//! worker attempt
//!     → client.rs (one GET to the configured URL, no retries)
//!     → status check, body read, JSON decode
//!     → Ok(LatencyReport) | Err(UpstreamError)
//! ```
//!
//! # Design Decisions
//! - One call per attempt; retrying is the race's job, not the client's
//! - Every failure is typed so workers can log the precise reason
//! - The `Upstream` trait is the seam between the race and the network

pub mod client;

use std::future::Future;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::HttpUpstream;

/// Payload returned by the upstream work endpoint, and echoed to callers on a win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyReport {
    /// Elapsed milliseconds reported by the upstream.
    pub time: u64,
}

/// Reasons a single upstream attempt produced no result.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection, TLS or request send failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("upstream returned HTTP status {0}")]
    Status(StatusCode),

    /// The response body could not be read to completion.
    #[error("body read error: {0}")]
    BodyRead(#[source] reqwest::Error),

    /// The body was not the expected JSON object.
    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A single-shot source of latency reports.
pub trait Upstream: Send + Sync + 'static {
    /// Perform exactly one call to the upstream.
    fn fetch(&self) -> impl Future<Output = Result<LatencyReport, UpstreamError>> + Send;
}
