//! In-memory test client.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderName, HeaderValue, Method, Request};
use http_body_util::Full;

use hermes_server::{AppConfig, DispatchEngine};

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Drives a [`DispatchEngine`] directly, without sockets.
///
/// Requests go through the same global middleware, lookup, route chain and
/// finalize steps as they would behind the real server.
///
/// # Example
///
/// ```rust
/// use hermes_core::handler_fn;
/// use hermes_server::{AppConfig, Controller, ControllerRoutes};
/// use hermes_test::TestClient;
///
/// struct Hello;
///
/// impl Controller for Hello {
///     fn routes(&self) -> ControllerRoutes {
///         ControllerRoutes::new("/hello").get("/:name", "greet", handler_fn(|ctx| {
///             Box::pin(async move {
///                 let name = ctx.param("name").unwrap_or("world").to_string();
///                 ctx.string(format!("hello {name}"), None, None)?;
///                 Ok(())
///             })
///         }))
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let client = TestClient::new(AppConfig::builder().mount(&Hello).build()).unwrap();
/// let response = client.get("/hello/ada").send().await;
/// response.assert_status(200).assert_body_eq("hello ada");
/// # });
/// ```
#[derive(Clone)]
pub struct TestClient {
    engine: Arc<DispatchEngine>,
    default_headers: Vec<(HeaderName, HeaderValue)>,
    remote_addr: Option<SocketAddr>,
}

impl TestClient {
    /// Builds the engine for `config`.
    ///
    /// # Errors
    ///
    /// Returns the route table's construction errors.
    pub fn new(config: AppConfig) -> Result<Self, TestError> {
        Ok(Self::from_engine(DispatchEngine::new(config)?))
    }

    /// Wraps an existing engine.
    #[must_use]
    pub fn from_engine(engine: DispatchEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            default_headers: Vec::new(),
            remote_addr: None,
        }
    }

    /// Adds a header sent with every request.
    ///
    /// # Panics
    ///
    /// Panics if the name or value is not valid HTTP.
    #[must_use]
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::try_from(name)
            .unwrap_or_else(|e| panic!("invalid default header name '{name}': {e}"));
        let value = HeaderValue::try_from(value)
            .unwrap_or_else(|e| panic!("invalid default header value '{value}': {e}"));
        self.default_headers.push((name, value));
        self
    }

    /// Sets the peer address reported to handlers through `ctx.ip()`.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Returns the engine.
    #[must_use]
    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    pub(crate) fn default_headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.default_headers
    }

    /// Starts a `GET` request.
    pub fn get(&self, uri: &str) -> TestRequestBuilder<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a `POST` request.
    pub fn post(&self, uri: &str) -> TestRequestBuilder<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a `PUT` request.
    pub fn put(&self, uri: &str) -> TestRequestBuilder<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a `PATCH` request.
    pub fn patch(&self, uri: &str) -> TestRequestBuilder<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a `DELETE` request.
    pub fn delete(&self, uri: &str) -> TestRequestBuilder<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a `HEAD` request.
    pub fn head(&self, uri: &str) -> TestRequestBuilder<'_> {
        self.request(Method::HEAD, uri)
    }

    /// Starts an `OPTIONS` request.
    pub fn options(&self, uri: &str) -> TestRequestBuilder<'_> {
        self.request(Method::OPTIONS, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: &str) -> TestRequestBuilder<'_> {
        TestRequestBuilder::new(self, method, uri)
    }

    pub(crate) async fn dispatch(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<TestResponse, TestError> {
        let response = self.engine.dispatch(request, self.remote_addr).await;
        TestResponse::from_http(response).await
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("engine", &self.engine)
            .field("default_headers", &self.default_headers)
            .field("remote_addr", &self.remote_addr)
            .finish()
    }
}
