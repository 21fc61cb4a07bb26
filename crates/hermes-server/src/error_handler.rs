//! Request-time error handling.
//!
//! When a chain fails, the dispatch engine hands the error to the
//! configured [`ErrorHandler`]. Its response is used as-is. If the error
//! handler itself fails, [`fallback_response`] is sent instead.

use std::sync::Arc;

use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Response, StatusCode};
use serde_json::json;

use hermes_core::response::full_body;
use hermes_core::{BoxFuture, HermesError, HermesResult, HttpResponse};

/// Turns a request-time error into a response.
pub trait ErrorHandler: Send + Sync + 'static {
    /// Builds the response for `error`.
    fn handle<'a>(&'a self, error: &'a HermesError) -> BoxFuture<'a, HermesResult<HttpResponse>>;
}

/// A shared error handler.
pub type BoxedErrorHandler = Arc<dyn ErrorHandler>;

/// Responds `500` with a JSON body carrying `message`, `stack` and `cause`.
///
/// ```json
/// {"message": "boom", "stack": "Handler { .. }", "cause": null}
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle<'a>(&'a self, error: &'a HermesError) -> BoxFuture<'a, HermesResult<HttpResponse>> {
        Box::pin(async move {
            let body = json!({
                "message": error.to_string(),
                "stack": format!("{error:?}"),
                "cause": error.cause_message(),
            });
            json_response(StatusCode::INTERNAL_SERVER_ERROR, &body)
        })
    }
}

/// Adapter for synchronous closures.
pub struct FnErrorHandler<F>(F);

impl<F> ErrorHandler for FnErrorHandler<F>
where
    F: Fn(&HermesError) -> HermesResult<HttpResponse> + Send + Sync + 'static,
{
    fn handle<'a>(&'a self, error: &'a HermesError) -> BoxFuture<'a, HermesResult<HttpResponse>> {
        Box::pin(async move { (self.0)(error) })
    }
}

/// Wraps a closure as an error handler.
///
/// ```rust
/// use hermes_server::{error_handler_fn, json_response};
/// use http::StatusCode;
///
/// let handler = error_handler_fn(|err| {
///     json_response(StatusCode::BAD_GATEWAY, &serde_json::json!({ "error": err.to_string() }))
/// });
/// ```
pub fn error_handler_fn<F>(func: F) -> BoxedErrorHandler
where
    F: Fn(&HermesError) -> HermesResult<HttpResponse> + Send + Sync + 'static,
{
    Arc::new(FnErrorHandler(func))
}

/// Serializes `body` into a JSON response.
///
/// # Errors
///
/// Fails if `body` cannot be serialized.
pub fn json_response<T: serde::Serialize + ?Sized>(
    status: StatusCode,
    body: &T,
) -> HermesResult<HttpResponse> {
    let bytes = serde_json::to_vec(body)?;
    let mut response = Response::new(full_body(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}

/// Minimal `500` sent when the error handler itself fails.
#[must_use]
pub fn fallback_response() -> HttpResponse {
    let mut response = Response::new(full_body("Internal Server Error"));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_default_handler_shape() {
        let err = HermesError::handler("boom");
        let response = DefaultErrorHandler.handle(&err).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

        let body = body_json(response).await;
        assert_eq!(body["message"], "boom");
        assert!(body["stack"].as_str().unwrap().contains("Handler"));
        assert!(body["cause"].is_null());
    }

    #[tokio::test]
    async fn test_default_handler_reports_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such row");
        let err = HermesError::with_source("lookup failed", io);
        let body = body_json(DefaultErrorHandler.handle(&err).await.unwrap()).await;
        assert_eq!(body["message"], "lookup failed");
        assert_eq!(body["cause"], "no such row");
    }

    #[tokio::test]
    async fn test_fn_error_handler() {
        let handler = error_handler_fn(|err| {
            json_response(StatusCode::BAD_REQUEST, &json!({ "error": err.to_string() }))
        });
        let err = HermesError::InvalidStatusCode(700);
        let response = handler.handle(&err).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("700"));
    }

    #[tokio::test]
    async fn test_fallback_response() {
        let response = fallback_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Internal Server Error");
    }
}
