//! Request ID middleware.
//!
//! Every request gets an identifier for log correlation. An inbound
//! `X-Request-ID` is reused when present; otherwise a UUID v7 is generated.
//! The ID is stored as the typed local [`RequestId`] and echoed in the
//! `X-Request-ID` response header.

use std::fmt;

use hermes_core::{BoxFuture, Context, Handler, HandlerResult};
use uuid::Uuid;

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest inbound ID that is reused.
const MAX_INCOMING_LEN: usize = 128;

/// The ID assigned to the current request.
///
/// ```rust
/// use hermes_middleware::RequestId;
///
/// let id = RequestId::generate();
/// assert_eq!(id.as_str().len(), 36);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generates a new time-ordered ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates or propagates request IDs.
#[derive(Debug, Clone)]
pub struct RequestIdMiddleware {
    trust_incoming: bool,
}

impl Default for RequestIdMiddleware {
    fn default() -> Self {
        Self {
            trust_incoming: true,
        }
    }
}

impl RequestIdMiddleware {
    /// Creates a middleware that reuses inbound IDs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Always generates a fresh ID, ignoring the inbound header.
    #[must_use]
    pub fn ignore_incoming() -> Self {
        Self {
            trust_incoming: false,
        }
    }

    fn incoming(&self, ctx: &Context) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }
        ctx.header(REQUEST_ID_HEADER)
            .map(str::trim)
            .filter(|id| !id.is_empty() && id.len() <= MAX_INCOMING_LEN)
            .map(|id| RequestId(id.to_string()))
    }
}

impl Handler for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let id = self.incoming(ctx).unwrap_or_else(RequestId::generate);
            ctx.set(REQUEST_ID_HEADER, id.as_str())?;
            ctx.set_local(id);
            ctx.next();
            Ok(())
        })
    }
}
