//! Structured logging for Hermes.
//!
//! Hermes logs through [`tracing`]. This crate owns the subscriber setup
//! ([`init_logging`]) and the request log events shared by the server
//! crates ([`log_request_complete!`], [`log_request_error!`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes_telemetry::{init_logging, LogConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging(&LogConfig::production())?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}
