//! A single staggered attempt.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::hedge::outcome::Outcome;
use crate::hedge::signal::CancellationBroadcast;
use crate::observability::metrics;
use crate::upstream::Upstream;

/// What one worker needs to run its attempt.
pub struct Attempt<U> {
    /// Position in the fan-out, starting at 0.
    pub index: usize,
    /// Delay before the upstream call (`index * stagger`).
    pub start_delay: Duration,
    pub upstream: Arc<U>,
    pub cancel: CancellationBroadcast,
    pub outcomes: mpsc::Sender<Outcome>,
}

/// Run one attempt to completion.
///
/// The cancellation check happens once, after the start delay. An upstream
/// call that has started is never interrupted; its result is simply not read
/// if another outcome already decided the race. Failures produce no outcome.
pub async fn run<U: Upstream>(attempt: Attempt<U>) {
    let Attempt {
        index,
        start_delay,
        upstream,
        cancel,
        outcomes,
    } = attempt;

    if !start_delay.is_zero() {
        tokio::time::sleep(start_delay).await;
    }

    if cancel.is_set() {
        tracing::debug!(attempt = index, "Race already won, skipping upstream call");
        metrics::record_attempt("skipped");
        return;
    }

    tracing::debug!(attempt = index, "Sending upstream request");

    match upstream.fetch().await {
        Ok(report) => {
            metrics::record_attempt("success");
            // Capacity covers every producer, so this only fails once the reader is gone.
            let _ = outcomes.try_send(Outcome::Success {
                latency_ms: report.time,
            });
            cancel.set();
        }
        Err(e) => {
            metrics::record_attempt("failure");
            tracing::warn!(attempt = index, error = %e, "Upstream attempt failed");
        }
    }
}
