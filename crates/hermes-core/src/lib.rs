//! # Hermes Core
//!
//! Core types for the Hermes dispatch engine:
//!
//! - [`Handler`] - A step of a handler chain
//! - [`HandlerChain`] - Ordered handlers with an explicit cursor
//! - [`Context`] - Per-request state threaded through every handler
//! - [`ResponseBuilder`] - Response accumulated while handlers run
//! - [`Locals`] - Typed request-scoped storage
//! - [`HermesError`] - Request-time error type
//!
//! Control flow is cooperative: a handler continues the chain by calling
//! [`Context::next`] and halts it by returning without doing so.

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod body;
mod chain;
mod context;
pub mod cookie;
mod error;
mod handler;
mod locals;
pub mod response;

pub use body::{FormValue, ParsedBody, UploadedFile};
pub use chain::HandlerChain;
pub use context::{Context, RequestBody};
pub use cookie::{SameSite, SetCookie};
pub use error::{BoxError, HermesError, HermesResult};
pub use handler::{
    handler_fn, named_handler, BoxFuture, BoxedHandler, FnHandler, Handler, HandlerResult,
};
pub use locals::Locals;
pub use response::{Body, HttpResponse, ResponseBody, ResponseBuilder};

pub use hermes_router::Params;
