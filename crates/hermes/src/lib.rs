//! # Hermes
//!
//! **Controller-based async HTTP framework with an explicit middleware chain**
//!
//! - **Controllers** declare routes once, under a prefix, with per-route
//!   before/after handlers
//! - **Groups** mount controllers under an extra prefix with their own middleware
//! - **One chain per request**: global middleware, then the matched route's
//!   group middleware, before handlers, handler and after handlers. A
//!   handler that does not call `next()` ends the request there.
//! - **Automatic `OPTIONS` and `HEAD`** answers derived from the route table
//! - **Structured logging** through `tracing`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hermes::prelude::*;
//!
//! struct Users;
//!
//! impl Controller for Users {
//!     fn routes(&self) -> ControllerRoutes {
//!         ControllerRoutes::new("/users").get("/:id", "show", handler_fn(|ctx| {
//!             Box::pin(async move {
//!                 let id = ctx.param("id").unwrap_or_default().to_string();
//!                 ctx.json(&serde_json::json!({ "id": id }), None)?;
//!                 Ok(())
//!             })
//!         }))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::builder()
//!         .port(8080)
//!         .middleware(Arc::new(RequestIdMiddleware::new()))
//!         .mount(&Users)
//!         .build();
//!
//!     let handle = Server::bind_with_shutdown(config, ShutdownSignal::with_os_signals()).await?;
//!     handle.stopped().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! Request → global middleware ──(halted)──────────────────────────┐
//!               ↓                                                 │
//!           route lookup → group mw → before → handler → after    │
//!               ↓ (no match)                                      ↓
//!           OPTIONS discovery / HEAD→GET / 404        finalize → Response
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use hermes_core as core;

// Re-export server types
pub use hermes_server as server;

// Re-export middleware types
pub use hermes_middleware as middleware;

// Re-export router types
pub use hermes_router as router;

// Re-export configuration types
pub use hermes_config as config;

// Re-export logging setup
pub use hermes_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use hermes::prelude::*;
///
/// let handler: BoxedHandler = handler_fn(|ctx| {
///     Box::pin(async move {
///         ctx.next();
///         Ok(())
///     })
/// });
/// assert_eq!(handler.name(), "anonymous");
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    pub use hermes_core::{
        handler_fn, named_handler, BoxFuture, BoxedHandler, Context, Handler, HandlerResult,
        HermesError, HermesResult, ParsedBody, SetCookie,
    };

    pub use hermes_server::{
        error_handler_fn, json_response, AppConfig, Controller, ControllerRoutes, ErrorHandler,
        Group, Server, ServerHandle, ShutdownSignal,
    };

    pub use hermes_middleware::{Cors, Helmet, Logger, RequestId, RequestIdMiddleware};

    pub use hermes_config::{ConfigLoader, HermesConfig};

    pub use hermes_telemetry::{init_logging, LogConfig, LogFormat};
}
