//! Request-time error types for Hermes.
//!
//! [`HermesError`] covers everything that can go wrong while a handler
//! chain runs: protocol-shape errors raised synchronously by [`Context`]
//! setters (bad status or redirect codes), body read and parse failures,
//! and arbitrary application failures bubbled from handlers.
//!
//! Application code can propagate any [`anyhow::Error`] with `?`; it is
//! wrapped as [`HermesError::Handler`].
//!
//! [`Context`]: crate::Context

use thiserror::Error;

/// Result type alias using [`HermesError`].
pub type HermesResult<T> = Result<T, HermesError>;

/// Boxed error type used by request and response bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Standard error type for request handling.
///
/// # Example
///
/// ```
/// use hermes_core::HermesError;
///
/// fn find_user(id: &str) -> Result<String, HermesError> {
///     if id.is_empty() {
///         return Err(HermesError::handler("user id must not be empty"));
///     }
///     Ok(format!("user-{id}"))
/// }
///
/// assert!(find_user("").is_err());
/// ```
#[derive(Error, Debug)]
pub enum HermesError {
    /// Status code outside 100-599.
    #[error("Invalid status code: {0} (expected 100-599)")]
    InvalidStatusCode(u16),

    /// Redirect status outside 300-399.
    #[error("Invalid redirect status: {0} (expected 300-399)")]
    InvalidRedirectStatus(u16),

    /// Redirect target could not be resolved against the request URL.
    #[error("Invalid redirect location '{location}': {reason}")]
    InvalidRedirectLocation {
        /// The location that was requested.
        location: String,
        /// Why it could not be resolved.
        reason: String,
    },

    /// The request URL could not be turned into an absolute URL.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// Header name or value is not valid HTTP.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader {
        /// The header name as supplied.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The request body stream failed.
    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    /// The request body did not match its declared content type.
    #[error("Malformed {kind} body: {message}")]
    MalformedBody {
        /// Content kind that was being parsed (json, form, multipart).
        kind: &'static str,
        /// Parser error message.
        message: String,
    },

    /// A response value could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A handler panicked while running.
    #[error("Handler panicked: {0}")]
    Panic(String),

    /// Application error raised by a handler.
    #[error("{message}")]
    Handler {
        /// Human-readable error message.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl HermesError {
    /// Creates an application error with a message.
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an application error with a message and an underlying cause.
    #[must_use]
    pub fn with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Handler {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an invalid header error.
    #[must_use]
    pub fn invalid_header(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a malformed body error.
    #[must_use]
    pub fn malformed_body(kind: &'static str, message: impl std::fmt::Display) -> Self {
        Self::MalformedBody {
            kind,
            message: message.to_string(),
        }
    }

    /// Returns the message of the underlying cause, if any.
    #[must_use]
    pub fn cause_message(&self) -> Option<String> {
        std::error::Error::source(self).map(ToString::to_string)
    }
}

impl From<anyhow::Error> for HermesError {
    fn from(err: anyhow::Error) -> Self {
        Self::Handler {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_status_display() {
        let err = HermesError::InvalidStatusCode(42);
        assert_eq!(err.to_string(), "Invalid status code: 42 (expected 100-599)");
    }

    #[test]
    fn test_handler_error_without_cause() {
        let err = HermesError::handler("boom");
        assert_eq!(err.to_string(), "boom");
        assert!(err.cause_message().is_none());
    }

    #[test]
    fn test_handler_error_with_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = HermesError::with_source("could not save", io);
        assert_eq!(err.to_string(), "could not save");
        assert_eq!(err.cause_message().as_deref(), Some("disk gone"));
    }

    #[test]
    fn test_from_anyhow() {
        let err: HermesError = anyhow::anyhow!("upstream failed").into();
        assert!(matches!(err, HermesError::Handler { .. }));
        assert_eq!(err.to_string(), "upstream failed");
    }

    #[test]
    fn test_malformed_body_display() {
        let err = HermesError::malformed_body("json", "expected value");
        assert_eq!(err.to_string(), "Malformed json body: expected value");
    }
}
