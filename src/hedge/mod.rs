//! Request hedging subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher.rs (one race per inbound request)
//!     ├─ worker.rs × N   (attempt i waits i × stagger, then calls upstream)
//!     ├─ guards.rs       (deadline guard, exhaustion guard)
//!     └─ all feed one bounded outcome channel (capacity N + 2)
//!            → dispatcher reads exactly one Outcome
//!            → http::response renders it
//! ```
//!
//! # Design Decisions
//! - First outcome to arrive wins, success or failure
//! - Failed attempts are silent; only the guards produce failures
//! - Producers use `try_send` and never wait on the reader
//! - Cancellation is checked once per worker, before its upstream call
//! - Per-race signals (`OnceSignal`) are watch-backed, so set/read is synchronized

pub mod dispatcher;
pub mod guards;
pub mod outcome;
pub mod signal;
pub mod worker;

pub use dispatcher::{HedgeDispatcher, HedgePolicy, HedgeRequest};
pub use outcome::{FailureReason, Outcome};
pub use signal::{CancellationBroadcast, CompletionFlag, OnceSignal};
