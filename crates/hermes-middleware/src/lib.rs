//! # Hermes Middleware
//!
//! Ready-made handlers for the global or group middleware chain.
//!
//! | Middleware | Purpose |
//! |------------|---------|
//! | [`RequestIdMiddleware`] | Reuse or generate `X-Request-ID` (UUID v7) |
//! | [`Logger`] | Structured request log line |
//! | [`Cors`] | CORS headers and preflight answers |
//! | [`Helmet`] | Security response headers |
//!
//! Each one is a plain [`Handler`](hermes_core::Handler): it edits the
//! context and calls `next()`, except for a CORS preflight which is
//! answered on the spot.
//!
//! ## Example
//!
//! ```rust,ignore
//! use hermes_middleware::{Cors, Helmet, Logger, RequestIdMiddleware};
//! use hermes_server::AppConfig;
//! use std::sync::Arc;
//!
//! let config = AppConfig::builder()
//!     .middleware(Arc::new(RequestIdMiddleware::new()))
//!     .middleware(Arc::new(Logger::new()))
//!     .middleware(Arc::new(Cors::permissive()))
//!     .middleware(Arc::new(Helmet::new()))
//!     .build();
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod stages;

pub use stages::cors::{AllowedOrigins, Cors, CorsBuilder, CorsConfig};
pub use stages::helmet::{FrameOptions, Helmet};
pub use stages::logger::Logger;
pub use stages::request_id::{RequestId, RequestIdMiddleware, REQUEST_ID_HEADER};
