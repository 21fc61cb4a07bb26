//! Handler trait and closure adapter.
//!
//! A handler mutates the [`Context`] (status, headers, body, locals) and
//! optionally calls [`Context::next`] to let the chain continue. Returning
//! without calling `next()` stops the chain.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::HermesResult;

/// A boxed future that is `Send` and has a lifetime.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result returned by every handler.
pub type HandlerResult = HermesResult<()>;

/// A shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// A step in a handler chain.
///
/// # Example
///
/// ```rust
/// use hermes_core::{BoxFuture, Context, Handler, HandlerResult};
///
/// struct PoweredBy;
///
/// impl Handler for PoweredBy {
///     fn name(&self) -> &'static str {
///         "powered_by"
///     }
///
///     fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
///         Box::pin(async move {
///             ctx.set("x-powered-by", "hermes")?;
///             ctx.next();
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Returns the name of this handler, used in logs.
    fn name(&self) -> &'static str {
        "handler"
    }

    /// Runs the handler against the request context.
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult>;
}

/// Adapter that turns a closure into a [`Handler`].
pub struct FnHandler<F> {
    name: &'static str,
    func: F,
}

impl<F> FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    /// Creates a new named closure handler.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        (self.func)(ctx)
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").field("name", &self.name).finish()
    }
}

/// Wraps a closure as a shared handler.
///
/// # Example
///
/// ```rust
/// use hermes_core::handler_fn;
///
/// let hello = handler_fn(|ctx| {
///     Box::pin(async move {
///         ctx.string("hello", None, None)?;
///         Ok(())
///     })
/// });
/// assert_eq!(hello.name(), "anonymous");
/// ```
pub fn handler_fn<F>(func: F) -> BoxedHandler
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    Arc::new(FnHandler::new("anonymous", func))
}

/// Wraps a closure as a shared handler with a name used in logs.
pub fn named_handler<F>(name: &'static str, func: F) -> BoxedHandler
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    Arc::new(FnHandler::new(name, func))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_handler_runs_closure() {
        let handler = named_handler("tagger", |ctx| {
            Box::pin(async move {
                ctx.set("x-tag", "1")?;
                Ok(())
            })
        });
        assert_eq!(handler.name(), "tagger");

        let mut ctx = Context::empty();
        handler.call(&mut ctx).await.unwrap();
        assert_eq!(ctx.response_header("x-tag").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let failing =
            handler_fn(|_ctx| Box::pin(async move { Err(crate::HermesError::handler("nope")) }));
        let mut ctx = Context::empty();
        let err = failing.call(&mut ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }
}
