//! Response builder.
//!
//! [`ResponseBuilder`] accumulates a status, a header multimap and a body
//! while handlers run. It is materialized into an [`HttpResponse`] exactly
//! once, when the request is finalized.

use std::convert::Infallible;

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Response, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};

use crate::error::BoxError;

/// Body type of every response produced by Hermes.
pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

/// A materialized HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Response body under construction.
#[derive(Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// A fully buffered body.
    Full(Bytes),
    /// A streaming body, forwarded as-is.
    Stream(ResponseBody),
}

impl Body {
    /// Returns the buffered bytes, if the body is buffered.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Full(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns true if no body has been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    fn into_response_body(self) -> ResponseBody {
        match self {
            Self::Empty => empty_body(),
            Self::Full(bytes) => full_body(bytes),
            Self::Stream(body) => body,
        }
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// Creates an empty response body.
#[must_use]
pub fn empty_body() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never: Infallible| -> BoxError { match never {} })
        .boxed_unsync()
}

/// Creates a buffered response body.
#[must_use]
pub fn full_body(bytes: impl Into<Bytes>) -> ResponseBody {
    Full::new(bytes.into())
        .map_err(|never: Infallible| -> BoxError { match never {} })
        .boxed_unsync()
}

/// Accumulates the response for one request.
///
/// Status and body follow last-write-wins. Headers are a multimap:
/// [`ResponseBuilder::set_header`] replaces every value of a name while
/// [`ResponseBuilder::append_header`] adds one more.
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl ResponseBuilder {
    /// Creates a `200 OK` response with no headers and no body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Replaces the status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns the headers set so far.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the headers for direct manipulation.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Replaces every value of `name` with `value`.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Adds `value` to `name`, keeping earlier values.
    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    /// Returns every value of `name` joined with `", "`.
    #[must_use]
    pub fn header_joined(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        (!values.is_empty()).then(|| values.join(", "))
    }

    /// Returns the body set so far.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Replaces the body and its content type.
    ///
    /// `None` as content type removes any previous `Content-Type`.
    pub fn set_body(&mut self, body: Body, content_type: Option<HeaderValue>) {
        match content_type {
            Some(value) => {
                self.headers.insert(header::CONTENT_TYPE, value);
            }
            None => {
                self.headers.remove(header::CONTENT_TYPE);
            }
        }
        self.body = body;
    }

    /// Replaces the whole response, dropping previous headers.
    pub fn replace(&mut self, status: StatusCode, headers: HeaderMap, body: Body) {
        self.status = status;
        self.headers = headers;
        self.body = body;
    }

    /// Materializes the response.
    #[must_use]
    pub fn into_response(self) -> HttpResponse {
        let mut response = Response::new(self.body.into_response_body());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    /// Materializes the response with the same status and headers but no body.
    #[must_use]
    pub fn into_response_without_body(self) -> HttpResponse {
        Self {
            body: Body::Empty,
            ..self
        }
        .into_response()
    }

    /// Builds a bodiless copy of the response without consuming it.
    #[must_use]
    pub fn to_response_without_body(&self) -> HttpResponse {
        let mut response = Response::new(empty_body());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.clone();
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(response: HttpResponse) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[test]
    fn test_default_is_ok_without_body() {
        let builder = ResponseBuilder::new();
        assert_eq!(builder.status(), StatusCode::OK);
        assert!(builder.body().is_empty());
        assert!(builder.headers().is_empty());
    }

    #[test]
    fn test_set_header_replaces_all_values() {
        let mut builder = ResponseBuilder::new();
        let name = HeaderName::from_static("x-test");
        builder.append_header(name.clone(), HeaderValue::from_static("a"));
        builder.append_header(name.clone(), HeaderValue::from_static("b"));
        assert_eq!(builder.header_joined("x-test").as_deref(), Some("a, b"));

        builder.set_header(name, HeaderValue::from_static("c"));
        assert_eq!(builder.header_joined("x-test").as_deref(), Some("c"));
    }

    #[test]
    fn test_set_body_overwrites_content_type_only() {
        let mut builder = ResponseBuilder::new();
        builder.set_header(
            HeaderName::from_static("x-keep"),
            HeaderValue::from_static("yes"),
        );
        builder.set_body(
            Body::Full(Bytes::from_static(b"{}")),
            Some(HeaderValue::from_static("application/json")),
        );
        builder.set_body(
            Body::Full(Bytes::from_static(b"hi")),
            Some(HeaderValue::from_static("text/plain")),
        );
        assert_eq!(builder.header_joined("content-type").as_deref(), Some("text/plain"));
        assert_eq!(builder.header_joined("x-keep").as_deref(), Some("yes"));
        assert_eq!(builder.body().as_bytes(), Some(&Bytes::from_static(b"hi")));
    }

    #[tokio::test]
    async fn test_into_response() {
        let mut builder = ResponseBuilder::new();
        builder.set_status(StatusCode::CREATED);
        builder.set_body(Body::Full(Bytes::from_static(b"made")), None);
        let response = builder.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(collect(response).await, Bytes::from_static(b"made"));
    }

    #[tokio::test]
    async fn test_without_body_keeps_status_and_headers() {
        let mut builder = ResponseBuilder::new();
        builder.set_status(StatusCode::ACCEPTED);
        builder.set_body(
            Body::Full(Bytes::from_static(b"payload")),
            Some(HeaderValue::from_static("text/plain")),
        );

        let copy = builder.to_response_without_body();
        assert_eq!(copy.status(), StatusCode::ACCEPTED);
        assert_eq!(copy.headers()[header::CONTENT_TYPE], "text/plain");
        assert!(collect(copy).await.is_empty());

        let consumed = builder.into_response_without_body();
        assert_eq!(consumed.status(), StatusCode::ACCEPTED);
        assert!(collect(consumed).await.is_empty());
    }
}
