//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → loader.rs (optional TOML file, parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → DispatcherConfig (validated, immutable for the process lifetime)
//! ```
//!
//! # Design Decisions
//! - Config is fixed once the listener is bound; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdmissionConfig, DispatcherConfig, HedgingConfig, ListenerConfig, ObservabilityConfig,
    UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
