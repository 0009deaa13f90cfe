//! Per-request race orchestration.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::Instrument;

use crate::config::HedgingConfig;
use crate::hedge::guards::{self, GuardSignals};
use crate::hedge::outcome::{FailureReason, Outcome};
use crate::hedge::signal::{CancellationBroadcast, CompletionFlag};
use crate::hedge::worker::{self, Attempt};
use crate::upstream::Upstream;

/// Fixed race shape, shared by every request of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HedgePolicy {
    pub fan_out: usize,
    pub stagger: Duration,
    pub default_deadline: Duration,
}

impl From<&HedgingConfig> for HedgePolicy {
    fn from(config: &HedgingConfig) -> Self {
        Self {
            fan_out: config.fan_out.max(1),
            stagger: config.stagger(),
            default_deadline: config.default_timeout(),
        }
    }
}

impl Default for HedgePolicy {
    fn default() -> Self {
        Self::from(&HedgingConfig::default())
    }
}

/// One inbound call being raced.
#[derive(Debug, Clone, Copy)]
pub struct HedgeRequest {
    pub fan_out: usize,
    pub stagger: Duration,
    pub deadline: Duration,
    pub started_at: Instant,
}

impl HedgeRequest {
    pub fn new(policy: &HedgePolicy, deadline: Option<Duration>) -> Self {
        Self {
            fan_out: policy.fan_out,
            stagger: policy.stagger,
            deadline: deadline.unwrap_or(policy.default_deadline),
            started_at: Instant::now(),
        }
    }

    /// When attempt `index` fires, relative to the request start.
    pub fn start_delay(&self, index: usize) -> Duration {
        self.stagger
            .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

/// Races `fan_out` staggered calls to one upstream per request.
pub struct HedgeDispatcher<U> {
    upstream: Arc<U>,
    policy: HedgePolicy,
}

impl<U: Upstream> HedgeDispatcher<U> {
    pub fn new(upstream: U, policy: HedgePolicy) -> Self {
        Self {
            upstream: Arc::new(upstream),
            policy,
        }
    }

    pub fn policy(&self) -> &HedgePolicy {
        &self.policy
    }

    /// Run one race and return the outcome that decides the response.
    ///
    /// `deadline` of `None` uses the policy default. Exactly one outcome is
    /// read; anything queued after it is dropped with the channel.
    pub async fn dispatch(&self, deadline: Option<Duration>) -> Outcome {
        let request = HedgeRequest::new(&self.policy, deadline);

        // One slot per worker plus both guards: no producer ever waits.
        let (tx, mut rx) = mpsc::channel(request.fan_out + 2);
        let won = CancellationBroadcast::new();
        let done = CompletionFlag::new();
        let _completion = done.set_on_drop();

        let workers = (0..request.fan_out)
            .map(|index| {
                tokio::spawn(worker::run(Attempt {
                    index,
                    start_delay: request.start_delay(index),
                    upstream: self.upstream.clone(),
                    cancel: won.clone(),
                    outcomes: tx.clone(),
                })
                .in_current_span())
            })
            .collect::<Vec<_>>();

        let signals = GuardSignals { won, done };
        // Spawned tasks inherit the caller's span so their events keep the request ID.
        tokio::spawn(
            guards::deadline_guard(request.deadline, signals.clone(), tx.clone()).in_current_span(),
        );
        tokio::spawn(guards::exhaustion_guard(workers, signals, tx).in_current_span());

        let outcome = rx
            .recv()
            .await
            .unwrap_or(Outcome::Failure(FailureReason::Exhausted(request.fan_out)));

        let elapsed_ms = request.started_at.elapsed().as_millis() as u64;
        match &outcome {
            Outcome::Success { latency_ms } => {
                tracing::info!(time = latency_ms, elapsed_ms, "Race won");
            }
            Outcome::Failure(reason) => {
                tracing::debug!(outcome = outcome.label(), elapsed_ms, %reason, "Race lost");
            }
        }

        outcome
    }
}
