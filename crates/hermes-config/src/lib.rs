//! Typed configuration for Hermes servers.
//!
//! - TOML and JSON files, strict about unknown fields
//! - `.env` files through `dotenvy`
//! - Environment overrides of the form `HERMES__SECTION__KEY`
//! - [`ConfigError`], also used for construction-time route table failures
//!
//! # Example
//!
//! ```no_run
//! use hermes_config::ConfigLoader;
//!
//! # fn main() -> Result<(), hermes_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("hermes.toml")?
//!     .with_env_prefix("HERMES")
//!     .load()?;
//! # Ok(())
//! # }
//! ```
//!
//! # File Format
//!
//! ```toml
//! [server]
//! hostname = "0.0.0.0"
//! port = 3000
//! prefix = "/api"
//! strict = false
//! disable_startup_message = false
//! shutdown_timeout_secs = 30
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `HERMES__SERVER__PORT=8080`
//! - `HERMES__SERVER__STRICT=true`
//! - `HERMES__LOGGING__LEVEL=debug`

#![doc(html_root_url = "https://docs.rs/hermes-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::HermesConfig;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::{LoggingSettings, ServerSettings};
