//! Test request building.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request};
use http_body_util::Full;
use serde::Serialize;

use crate::client::TestClient;
use crate::error::TestError;
use crate::response::TestResponse;

/// A request being assembled for a [`TestClient`].
///
/// Errors from `header`, `json` or `form` are held until the request is
/// sent, so calls can be chained freely.
#[must_use]
pub struct TestRequestBuilder<'a> {
    client: &'a TestClient,
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TestError>,
}

impl<'a> TestRequestBuilder<'a> {
    pub(crate) fn new(client: &'a TestClient, method: Method, uri: &str) -> Self {
        let mut headers = HeaderMap::new();
        for (name, value) in client.default_headers() {
            headers.insert(name.clone(), value.clone());
        }
        Self {
            client,
            method,
            uri: uri.to_string(),
            headers,
            body: Bytes::new(),
            error: None,
        }
    }

    fn fail(&mut self, error: TestError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Appends a request header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value.as_ref()),
        ) {
            (Ok(n), Ok(v)) => {
                self.headers.append(n, v);
            }
            _ => self.fail(TestError::InvalidHeader(name.to_string())),
        }
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        match HeaderValue::try_from(content_type.as_ref()) {
            Ok(v) => {
                self.headers.insert(header::CONTENT_TYPE, v);
            }
            Err(_) => self.fail(TestError::InvalidHeader(header::CONTENT_TYPE.to_string())),
        }
        self
    }

    /// Sets a `Bearer` authorization header.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(header::AUTHORIZATION.as_str(), format!("Bearer {}", token.as_ref()))
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Bytes::from(bytes);
                self.content_type("application/json")
            }
            Err(e) => {
                self.fail(e.into());
                self
            }
        }
    }

    /// Sets a URL-encoded form body.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => {
                self.body = Bytes::from(encoded);
                self.content_type("application/x-www-form-urlencoded")
            }
            Err(e) => {
                self.fail(e.into());
                self
            }
        }
    }

    /// Builds the `http::Request` without sending it.
    pub fn build(self) -> Result<Request<Full<Bytes>>, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let mut request = Request::builder()
            .method(self.method)
            .uri(self.uri.as_str())
            .body(Full::new(self.body))
            .map_err(|e| TestError::RequestBuild(format!("'{}': {e}", self.uri)))?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }

    /// Sends the request.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let client = self.client;
        let request = self.build()?;
        client.dispatch(request).await
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }
}

impl std::fmt::Debug for TestRequestBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestRequestBuilder")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}
