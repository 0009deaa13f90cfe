//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → request.rs (request ID, deadline from path or query)
//!     → security::admission (429 when over the in-flight bound)
//!     → hedge::dispatcher (race N staggered upstream calls)
//!     → response.rs (render the single deciding outcome)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{build_router, AppState, HttpServer};
