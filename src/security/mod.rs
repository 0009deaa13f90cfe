//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming /api/smart request:
//!     → admission.rs (bound on in-flight races, 429 when exceeded)
//!     → Pass to hedge dispatcher
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject when the bound is exceeded, never queue
//! - Slot release is tied to a permit's lifetime, not to a code path

pub mod admission;

pub use admission::{AdmissionGate, AdmissionPermit};
