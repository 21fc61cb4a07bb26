//! Request logger.
//!
//! Logs each request as it enters the global chain. Route handlers run only
//! after the global chain is done, so the final status and duration are not
//! known here; the dispatch engine logs them on completion.

use hermes_core::{BoxFuture, Context, Handler, HandlerResult};
use hermes_telemetry::fields;
use tracing::Level;

use crate::stages::request_id::RequestId;

/// Logs request id, method and path of every request.
#[derive(Debug, Clone)]
pub struct Logger {
    level: Level,
}

impl Default for Logger {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl Logger {
    /// Creates a logger emitting at `INFO`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level of the emitted events.
    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

impl Handler for Logger {
    fn name(&self) -> &'static str {
        "logger"
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            ctx.next();

            let request_id = ctx.local::<RequestId>().map(ToString::to_string);

            macro_rules! emit {
                ($lvl:expr) => {
                    tracing::event!(
                        $lvl,
                        { fields::REQUEST_ID } = request_id.as_deref(),
                        { fields::METHOD } = %ctx.method(),
                        { fields::PATH } = ctx.path(),
                        "Request received"
                    )
                };
            }

            // Callsites need a constant level.
            if self.level == Level::TRACE {
                emit!(Level::TRACE);
            } else if self.level == Level::DEBUG {
                emit!(Level::DEBUG);
            } else if self.level == Level::WARN {
                emit!(Level::WARN);
            } else if self.level == Level::ERROR {
                emit!(Level::ERROR);
            } else {
                emit!(Level::INFO);
            }
            Ok(())
        })
    }
}
