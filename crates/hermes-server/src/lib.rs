//! # Hermes Server
//!
//! Turns an application configuration into a running HTTP service.
//!
//! - [`Controller`] / [`ControllerRoutes`]: explicit route declarations
//! - [`AppConfig`]: prefix, controllers, groups, middlewares, error handler
//! - [`RouteTable`]: the composed, immutable route set
//! - [`DispatchEngine`]: global middleware, lookup, route chain, finalize
//! - [`Server`] / [`ServerHandle`]: the hyper host with graceful shutdown
//!
//! ## Example
//!
//! ```rust,ignore
//! use hermes_core::handler_fn;
//! use hermes_server::{AppConfig, Controller, ControllerRoutes, Server};
//!
//! struct Health;
//!
//! impl Controller for Health {
//!     fn routes(&self) -> ControllerRoutes {
//!         ControllerRoutes::new("/health").get("/", "check", handler_fn(|ctx| {
//!             Box::pin(async move {
//!                 ctx.json(&serde_json::json!({ "ok": true }), None)?;
//!                 Ok(())
//!             })
//!         }))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handle = Server::bind(AppConfig::builder().mount(&Health).build()).await?;
//!     handle.stopped().await;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
pub mod controller;
pub mod dispatch;
pub mod error_handler;
pub mod routes;
pub mod server;
pub mod shutdown;

pub use app::{AppConfig, AppConfigBuilder, Group};
pub use controller::{
    Controller, ControllerId, ControllerRoutes, RouteDef, RouteMethod, RouteRegistry,
};
pub use dispatch::{drive, ChainOutcome, DispatchEngine, Outcome};
pub use error_handler::{
    error_handler_fn, fallback_response, json_response, BoxedErrorHandler, DefaultErrorHandler,
    ErrorHandler, FnErrorHandler,
};
pub use routes::{compose_path, Route, RouteTable};
pub use server::{Server, ServerError, ServerHandle};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownReceiver, ShutdownSignal};
