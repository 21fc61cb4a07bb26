//! The dispatch engine.
//!
//! Every request walks the same states:
//!
//! 1. **Global middleware**: the app-level chain runs first. If a handler
//!    halts it, the current response is returned and routing never happens.
//! 2. **Route lookup**: exact method, then `ALL`, then (for `OPTIONS`) the
//!    `Allow` probe, then (for `HEAD`) the `GET` route, then not-found.
//! 3. **Route chain**: `before ++ [handler] ++ after` for the matched route.
//! 4. **Finalize**: `HEAD` and `OPTIONS` responses lose their body.
//!
//! Errors and panics from any handler are caught once, here, and turned
//! into a response by the configured [`ErrorHandler`](crate::ErrorHandler).

use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures_util::FutureExt;
use http::header::{self, HeaderValue};
use http::{Method, Request, StatusCode};
use hyper::body::Body as HttpBody;
use serde_json::json;

use hermes_config::ConfigResult;
use hermes_core::{
    Body, BoxError, BoxedHandler, Context, HandlerChain, HermesError, HermesResult, HttpResponse,
    Params,
};

use crate::app::AppConfig;
use crate::controller::RouteMethod;
use crate::error_handler::{fallback_response, BoxedErrorHandler};
use crate::routes::{Route, RouteTable};

/// How a chain run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Every handler called `next()`.
    Exhausted,
    /// A handler returned without calling `next()`.
    Halted,
}

/// Runs the context's active chain.
///
/// Each handler is awaited in turn. The loop stops early when a handler
/// leaves the cursor where it found it.
///
/// # Errors
///
/// Returns the first error raised by a handler; the rest of the chain does
/// not run.
pub async fn drive(ctx: &mut Context) -> HermesResult<ChainOutcome> {
    while ctx.chain().has_next() {
        let cursor = ctx.chain().cursor();
        let Some(handler) = ctx.chain().current() else {
            break;
        };
        handler.call(ctx).await?;
        if ctx.chain().cursor() == cursor {
            tracing::trace!(handler = handler.name(), cursor, "Chain halted");
            return Ok(ChainOutcome::Halted);
        }
    }
    Ok(ChainOutcome::Exhausted)
}

/// Where a request ended up, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A global middleware halted the request.
    Intercepted,
    /// A route chain ran.
    Routed,
    /// Answered by `OPTIONS` method discovery.
    Discovered,
    /// No route matched.
    NotFound,
    /// A handler failed or panicked.
    Failed,
}

impl Outcome {
    /// Returns a short label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intercepted => "intercepted",
            Self::Routed => "routed",
            Self::Discovered => "discovered",
            Self::NotFound => "not_found",
            Self::Failed => "failed",
        }
    }
}

enum Resolution {
    Route(Arc<Route>, Params),
    Allow(String),
    NotFound,
}

/// Turns requests into responses.
///
/// Built once from an [`AppConfig`] and shared by every connection.
pub struct DispatchEngine {
    table: RouteTable,
    middlewares: Arc<[BoxedHandler]>,
    error_handler: BoxedErrorHandler,
}

impl DispatchEngine {
    /// Builds the route table and the global chain.
    ///
    /// # Errors
    ///
    /// Returns the route table's construction errors.
    pub fn new(config: AppConfig) -> ConfigResult<Self> {
        let table = RouteTable::build(&config)?;
        Ok(Self {
            table,
            middlewares: config.middlewares.into(),
            error_handler: config.error_handler,
        })
    }

    /// Returns the route table.
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Handles one request.
    ///
    /// Never fails: handler errors go through the error handler and, if
    /// that fails too, a plain `500` is returned.
    pub async fn dispatch<B>(
        &self,
        request: Request<B>,
        remote_addr: Option<SocketAddr>,
    ) -> HttpResponse
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let started = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let mut ctx = Context::new(request, remote_addr);

        let run = AssertUnwindSafe(self.run(&mut ctx)).catch_unwind().await;
        let (response, outcome) = match run {
            Ok(Ok(outcome)) => (finalize(&mut ctx, &method), outcome),
            Ok(Err(err)) => (self.handle_error(&method, &path, err).await, Outcome::Failed),
            Err(payload) => {
                let err = HermesError::Panic(panic_message(payload.as_ref()));
                (self.handle_error(&method, &path, err).await, Outcome::Failed)
            }
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        hermes_telemetry::log_request_complete!(
            method,
            path,
            response.status().as_u16(),
            elapsed_ms,
            outcome.as_str()
        );
        response
    }

    async fn run(&self, ctx: &mut Context) -> HermesResult<Outcome> {
        ctx.replace_chain(HandlerChain::new(Arc::clone(&self.middlewares)));
        if drive(ctx).await? == ChainOutcome::Halted {
            return Ok(Outcome::Intercepted);
        }

        let method = ctx.method().clone();
        let path = ctx.path().to_string();

        match self.resolve(&method, &path) {
            Resolution::Route(route, params) => {
                tracing::debug!(
                    route = %route.key(),
                    handler = %route.fn_name(),
                    "Matched route"
                );
                ctx.set_params(params);
                ctx.replace_chain(HandlerChain::new(route.chain()));
                drive(ctx).await?;
                Ok(Outcome::Routed)
            }
            Resolution::Allow(allow) => {
                let value = HeaderValue::from_str(&allow)
                    .map_err(|e| HermesError::invalid_header(header::ALLOW.as_str(), e))?;
                let response = ctx.response_mut();
                response.set_status(StatusCode::NO_CONTENT);
                response.set_header(header::ALLOW, value);
                response.set_body(Body::Empty, None);
                Ok(Outcome::Discovered)
            }
            Resolution::NotFound => {
                if method == Method::HEAD {
                    let response = ctx.response_mut();
                    response.set_status(StatusCode::NOT_FOUND);
                    response.set_body(Body::Empty, None);
                } else {
                    ctx.json(&json!({ "message": "Not Found" }), Some(404))?;
                }
                Ok(Outcome::NotFound)
            }
        }
    }

    fn resolve(&self, method: &Method, path: &str) -> Resolution {
        let matched = self
            .table
            .lookup(method.as_str(), path)
            .or_else(|| self.table.lookup(RouteMethod::All.as_str(), path));
        if let Some(found) = matched {
            return Resolution::Route(Arc::clone(found.value), found.params);
        }

        if method == Method::OPTIONS {
            let allowed = self.table.allowed_methods(path);
            if !allowed.is_empty() {
                return Resolution::Allow(allowed.join(", "));
            }
        }

        if method == Method::HEAD {
            if let Some(found) = self.table.lookup(RouteMethod::Get.as_str(), path) {
                return Resolution::Route(Arc::clone(found.value), found.params);
            }
        }

        Resolution::NotFound
    }

    async fn handle_error(&self, method: &Method, path: &str, err: HermesError) -> HttpResponse {
        hermes_telemetry::log_request_error!(method, path, err);

        match AssertUnwindSafe(self.error_handler.handle(&err))
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(handler_err)) => {
                tracing::warn!(error = %handler_err, "Error handler failed, sending fallback 500");
                fallback_response()
            }
            Err(payload) => {
                tracing::warn!(
                    panic = %panic_message(payload.as_ref()),
                    "Error handler panicked, sending fallback 500"
                );
                fallback_response()
            }
        }
    }
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("table", &self.table)
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

fn finalize(ctx: &mut Context, method: &Method) -> HttpResponse {
    let response = ctx.take_response();
    if method == Method::HEAD || method == Method::OPTIONS {
        response.into_response_without_body()
    } else {
        response.into_response()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
