//! Race outcomes.

use std::time::Duration;

use thiserror::Error;

/// The value that decides an inbound request's response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A worker got a valid report from the upstream.
    Success { latency_ms: u64 },
    /// A guard detected that no worker will win.
    Failure(FailureReason),
}

/// Why a race ended without a winner. `Display` is the response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// The deadline elapsed before any success.
    ///
    /// Rendered in whole milliseconds, truncated: one second reads `(1000ms)`.
    #[error("No successful response within timeout ({}ms).", .0.as_millis())]
    Timeout(Duration),

    /// Every attempt finished without success.
    #[error("No successful response out of {0} attempts.")]
    Exhausted(usize),
}

impl Outcome {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "win",
            Outcome::Failure(FailureReason::Timeout(_)) => "timeout",
            Outcome::Failure(FailureReason::Exhausted(_)) => "exhausted",
        }
    }
}
