//! Hedged request dispatcher library.
//!
//! Each inbound `GET /api/smart` issues several staggered calls to one
//! upstream endpoint and answers with the first successful result, or with a
//! failure once the deadline elapses or every attempt has failed.

// Core subsystems
pub mod config;
pub mod hedge;
pub mod http;
pub mod upstream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::DispatcherConfig;
pub use hedge::{HedgeDispatcher, HedgePolicy, Outcome};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
