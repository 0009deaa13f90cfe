//! Single-assignment signals shared by the tasks of one race.

use std::sync::Arc;

use tokio::sync::watch;

/// A flag that flips from unset to set exactly once and never back.
///
/// Backed by a `watch` channel so readers can either poll it
/// ([`OnceSignal::is_set`]) or park until it flips ([`OnceSignal::wait`]).
#[derive(Debug, Clone)]
pub struct OnceSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl OnceSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Set the signal. Returns `true` only for the call that actually set it.
    pub fn set(&self) -> bool {
        self.tx.send_if_modified(|set| {
            if *set {
                false
            } else {
                *set = true;
                true
            }
        })
    }

    /// Non-blocking check.
    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the signal is set (immediately if it already is).
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|set| *set).await;
    }

    /// Returns a guard that sets the signal when dropped.
    pub fn set_on_drop(&self) -> SetOnDrop {
        SetOnDrop {
            signal: self.clone(),
        }
    }
}

impl Default for OnceSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Sets the wrapped [`OnceSignal`] on every exit path of its owner.
#[derive(Debug)]
pub struct SetOnDrop {
    signal: OnceSignal,
}

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.signal.set();
    }
}

/// Set by the first winning worker; read by workers that have not called upstream yet.
pub type CancellationBroadcast = OnceSignal;

/// Set once the race's response has been decided; read by the guards.
pub type CompletionFlag = OnceSignal;
