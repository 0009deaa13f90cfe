//! Fallback producers that end a race without a winner.
//!
//! Both guards write at most one [`Outcome::Failure`], and only while neither
//! a winner has been recorded nor the response been decided. Otherwise they
//! exit without touching the outcome channel.

use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::hedge::outcome::{FailureReason, Outcome};
use crate::hedge::signal::{CancellationBroadcast, CompletionFlag};

/// Signals a guard consults before failing the race.
#[derive(Debug, Clone)]
pub struct GuardSignals {
    /// Set by the winning worker, right after its outcome was queued.
    pub won: CancellationBroadcast,
    /// Set when the response writer has taken an outcome.
    pub done: CompletionFlag,
}

impl GuardSignals {
    fn settled(&self) -> bool {
        self.done.is_set() || self.won.is_set()
    }
}

/// Fail the race with a timeout once `deadline` elapses.
pub async fn deadline_guard(
    deadline: Duration,
    signals: GuardSignals,
    outcomes: mpsc::Sender<Outcome>,
) {
    tokio::select! {
        _ = tokio::time::sleep(deadline) => {}
        _ = signals.done.wait() => return,
    }

    if signals.settled() {
        return;
    }

    let reason = FailureReason::Timeout(deadline);
    tracing::warn!(timeout_ms = deadline.as_millis() as u64, "FAIL: {}", reason);
    let _ = outcomes.try_send(Outcome::Failure(reason));
}

/// Fail the race as exhausted once every worker has finished.
pub async fn exhaustion_guard(
    workers: Vec<JoinHandle<()>>,
    signals: GuardSignals,
    outcomes: mpsc::Sender<Outcome>,
) {
    let attempts = workers.len();

    tokio::select! {
        results = join_all(workers) => {
            for err in results.into_iter().filter_map(Result::err) {
                tracing::error!(error = %err, "Worker task ended abnormally");
            }
        }
        _ = signals.done.wait() => return,
    }

    if signals.settled() {
        return;
    }

    let reason = FailureReason::Exhausted(attempts);
    tracing::warn!(attempts, "FAIL: {}", reason);
    let _ = outcomes.try_send(Outcome::Failure(reason));
}
