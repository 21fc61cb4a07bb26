//! CORS (Cross-Origin Resource Sharing) middleware.
//!
//! Preflight requests (`OPTIONS` carrying `Origin` and
//! `Access-Control-Request-Method`) are answered directly with `204` and
//! the chain stops there. Other requests from an allowed origin get
//! `Access-Control-Allow-Origin` (plus credentials and exposed headers when
//! configured) before the chain continues.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use hermes_middleware::Cors;
//! use http::Method;
//!
//! let cors = Cors::builder()
//!     .allow_origin("https://app.example.com")
//!     .allow_methods([Method::GET, Method::POST])
//!     .allow_headers(["Content-Type", "Authorization"])
//!     .allow_credentials(true)
//!     .max_age(Duration::from_secs(600))
//!     .build();
//! ```

use std::time::Duration;

use hermes_core::{Body, BoxFuture, Context, Handler, HandlerResult, HermesError, HermesResult};
use http::header::{self, HeaderName, HeaderValue};
use http::{Method, StatusCode};

/// CORS header names.
pub mod headers {
    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// `Access-Control-Allow-Credentials` header.
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    /// `Access-Control-Max-Age` header.
    pub const MAX_AGE: &str = "access-control-max-age";
    /// `Access-Control-Expose-Headers` header.
    pub const EXPOSE_HEADERS: &str = "access-control-expose-headers";
    /// `Access-Control-Request-Method` header (preflight).
    pub const REQUEST_METHOD: &str = "access-control-request-method";
    /// `Access-Control-Request-Headers` header (preflight).
    pub const REQUEST_HEADERS: &str = "access-control-request-headers";
    /// `Origin` header.
    pub const ORIGIN: &str = "origin";
}

/// The set of allowed origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Any origin (`*`).
    Any,
    /// Exactly these origins.
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Returns true if `origin` may make cross-origin requests.
    #[must_use]
    pub fn is_allowed(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => origins.iter().any(|o| o == origin),
        }
    }

    fn header_value(&self, origin: &str) -> HermesResult<HeaderValue> {
        match self {
            Self::Any => Ok(HeaderValue::from_static("*")),
            Self::List(_) => HeaderValue::from_str(origin)
                .map_err(|e| HermesError::invalid_header(headers::ALLOW_ORIGIN, e)),
        }
    }
}

/// CORS settings.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    allowed_origins: AllowedOrigins,
    allowed_methods: Vec<Method>,
    allowed_headers: Vec<String>,
    expose_headers: Vec<String>,
    allow_credentials: bool,
    max_age: Option<Duration>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: AllowedOrigins::List(Vec::new()),
            allowed_methods: vec![
                Method::GET,
                Method::HEAD,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
            ],
            allowed_headers: vec![
                "content-type".to_string(),
                "authorization".to_string(),
                "x-request-id".to_string(),
            ],
            expose_headers: Vec::new(),
            allow_credentials: false,
            max_age: Some(Duration::from_secs(86400)),
        }
    }
}

/// Builder for [`Cors`].
#[derive(Debug, Clone, Default)]
pub struct CorsBuilder {
    config: CorsConfig,
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

impl CorsBuilder {
    /// Creates a builder with no allowed origins.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows every origin.
    ///
    /// Browsers reject `*` together with credentials.
    #[must_use]
    pub fn allow_any_origin(mut self) -> Self {
        self.config.allowed_origins = AllowedOrigins::Any;
        self
    }

    /// Adds an allowed origin. No effect after [`allow_any_origin`](Self::allow_any_origin).
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        if let AllowedOrigins::List(origins) = &mut self.config.allowed_origins {
            push_unique(origins, origin.into());
        }
        self
    }

    /// Replaces the allowed methods.
    #[must_use]
    pub fn allow_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.config.allowed_methods.clear();
        for method in methods {
            if !self.config.allowed_methods.contains(&method) {
                self.config.allowed_methods.push(method);
            }
        }
        self
    }

    /// Replaces the allowed request headers. `"*"` allows any.
    #[must_use]
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_headers.clear();
        for h in headers {
            push_unique(&mut self.config.allowed_headers, h.into().to_lowercase());
        }
        self
    }

    /// Replaces the headers exposed to scripts.
    #[must_use]
    pub fn expose_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.expose_headers.clear();
        for h in headers {
            push_unique(&mut self.config.expose_headers, h.into().to_lowercase());
        }
        self
    }

    /// Sets `Access-Control-Allow-Credentials`.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.config.allow_credentials = allow;
        self
    }

    /// Sets how long browsers may cache preflight results.
    #[must_use]
    pub fn max_age(mut self, duration: Duration) -> Self {
        self.config.max_age = Some(duration);
        self
    }

    /// Omits `Access-Control-Max-Age`.
    #[must_use]
    pub fn no_max_age(mut self) -> Self {
        self.config.max_age = None;
        self
    }

    /// Builds the middleware.
    #[must_use]
    pub fn build(self) -> Cors {
        Cors {
            config: self.config,
        }
    }
}

/// CORS middleware.
#[derive(Debug, Clone, Default)]
pub struct Cors {
    config: CorsConfig,
}

enum Preflight {
    Allowed,
    Rejected(&'static str),
}

impl Cors {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> CorsBuilder {
        CorsBuilder::new()
    }

    /// Allows any origin, method and header. Meant for development.
    #[must_use]
    pub fn permissive() -> Self {
        CorsBuilder::new()
            .allow_any_origin()
            .allow_methods([
                Method::GET,
                Method::HEAD,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::OPTIONS,
            ])
            .allow_headers(["*"])
            .build()
    }

    /// Returns the settings.
    #[must_use]
    pub fn config(&self) -> &CorsConfig {
        &self.config
    }

    fn check_preflight(&self, ctx: &Context) -> Preflight {
        let requested = ctx
            .header(headers::REQUEST_METHOD)
            .and_then(|m| m.parse::<Method>().ok());
        match requested {
            Some(method) if self.config.allowed_methods.contains(&method) => {}
            _ => return Preflight::Rejected("Method not allowed"),
        }

        if let Some(requested) = ctx.header(headers::REQUEST_HEADERS) {
            let any = self.config.allowed_headers.iter().any(|h| h == "*");
            let all_allowed = requested
                .split(',')
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .all(|h| any || self.config.allowed_headers.contains(&h));
            if !all_allowed {
                return Preflight::Rejected("Header not allowed");
            }
        }

        Preflight::Allowed
    }

    fn set_origin_headers(&self, ctx: &mut Context, origin: &str) -> HermesResult<()> {
        let value = self.config.allowed_origins.header_value(origin)?;
        let response = ctx.response_mut();
        response.set_header(HeaderName::from_static(headers::ALLOW_ORIGIN), value);

        if self.config.allow_credentials {
            response.set_header(
                HeaderName::from_static(headers::ALLOW_CREDENTIALS),
                HeaderValue::from_static("true"),
            );
        }
        if matches!(self.config.allowed_origins, AllowedOrigins::List(_)) {
            response.append_header(header::VARY, HeaderValue::from_static("Origin"));
        }
        Ok(())
    }

    fn answer_preflight(&self, ctx: &mut Context, origin: &str) -> HermesResult<()> {
        self.set_origin_headers(ctx, origin)?;

        let methods = self
            .config
            .allowed_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if !methods.is_empty() {
            ctx.set(headers::ALLOW_METHODS, &methods)?;
        }
        if !self.config.allowed_headers.is_empty() {
            ctx.set(headers::ALLOW_HEADERS, &self.config.allowed_headers.join(", "))?;
        }
        if let Some(max_age) = self.config.max_age {
            ctx.set(headers::MAX_AGE, &max_age.as_secs().to_string())?;
        }

        let response = ctx.response_mut();
        response.set_status(StatusCode::NO_CONTENT);
        response.set_body(Body::Empty, None);
        Ok(())
    }
}

impl Handler for Cors {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let Some(origin) = ctx.header(headers::ORIGIN).map(ToString::to_string) else {
                ctx.next();
                return Ok(());
            };
            let is_preflight =
                ctx.method() == Method::OPTIONS && ctx.header(headers::REQUEST_METHOD).is_some();

            if !self.config.allowed_origins.is_allowed(&origin) {
                if is_preflight {
                    tracing::debug!(origin = %origin, "CORS preflight from disallowed origin");
                    ctx.string("Origin not allowed", Some(403), None)?;
                } else {
                    ctx.next();
                }
                return Ok(());
            }

            if is_preflight {
                match self.check_preflight(ctx) {
                    Preflight::Allowed => self.answer_preflight(ctx, &origin)?,
                    Preflight::Rejected(reason) => {
                        tracing::debug!(origin = %origin, reason, "CORS preflight rejected");
                        ctx.string(reason, Some(403), None)?;
                    }
                }
                return Ok(());
            }

            self.set_origin_headers(ctx, &origin)?;
            if !self.config.expose_headers.is_empty() {
                ctx.set(headers::EXPOSE_HEADERS, &self.config.expose_headers.join(", "))?;
            }
            ctx.next();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::{run, run_with};

    fn restrictive() -> Cors {
        Cors::builder()
            .allow_origin("https://app.example.com")
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(["Content-Type", "X-Custom"])
            .expose_headers(["X-Request-ID"])
            .allow_credentials(true)
            .max_age(Duration::from_secs(600))
            .build()
    }

    #[tokio::test]
    async fn test_no_origin_passes_through() {
        let (ctx, advanced) = run(restrictive(), &[]).await;
        assert!(advanced);
        assert!(ctx.response_header(headers::ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_simple_request_from_allowed_origin() {
        let (ctx, advanced) = run(restrictive(), &[("origin", "https://app.example.com")]).await;
        assert!(advanced);
        assert_eq!(
            ctx.response_header(headers::ALLOW_ORIGIN).as_deref(),
            Some("https://app.example.com")
        );
        assert_eq!(ctx.response_header(headers::ALLOW_CREDENTIALS).as_deref(), Some("true"));
        assert_eq!(ctx.response_header(headers::EXPOSE_HEADERS).as_deref(), Some("x-request-id"));
        assert_eq!(ctx.response_header("vary").as_deref(), Some("Origin"));
    }

    #[tokio::test]
    async fn test_simple_request_from_other_origin() {
        let (ctx, advanced) = run(restrictive(), &[("origin", "https://evil.example")]).await;
        assert!(advanced);
        assert!(ctx.response_header(headers::ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_preflight_short_circuits() {
        let (ctx, advanced) = run_with(
            restrictive(),
            Method::OPTIONS,
            &[
                ("origin", "https://app.example.com"),
                (headers::REQUEST_METHOD, "POST"),
                (headers::REQUEST_HEADERS, "content-type, x-custom"),
            ],
        )
        .await;
        assert!(!advanced);
        assert_eq!(ctx.response().status(), StatusCode::NO_CONTENT);
        assert_eq!(ctx.response_header(headers::ALLOW_METHODS).as_deref(), Some("GET, POST"));
        assert_eq!(
            ctx.response_header(headers::ALLOW_HEADERS).as_deref(),
            Some("content-type, x-custom")
        );
        assert_eq!(ctx.response_header(headers::MAX_AGE).as_deref(), Some("600"));
        assert!(ctx.response().body().is_empty());
    }

    #[tokio::test]
    async fn test_preflight_rejects_method() {
        let (ctx, advanced) = run_with(
            restrictive(),
            Method::OPTIONS,
            &[("origin", "https://app.example.com"), (headers::REQUEST_METHOD, "DELETE")],
        )
        .await;
        assert!(!advanced);
        assert_eq!(ctx.response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_preflight_rejects_header() {
        let (ctx, _) = run_with(
            restrictive(),
            Method::OPTIONS,
            &[
                ("origin", "https://app.example.com"),
                (headers::REQUEST_METHOD, "GET"),
                (headers::REQUEST_HEADERS, "x-secret"),
            ],
        )
        .await;
        assert_eq!(ctx.response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_preflight_rejects_origin() {
        let (ctx, advanced) = run_with(
            restrictive(),
            Method::OPTIONS,
            &[("origin", "https://evil.example"), (headers::REQUEST_METHOD, "GET")],
        )
        .await;
        assert!(!advanced);
        assert_eq!(ctx.response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_plain_options_is_not_preflight() {
        let (_, advanced) = run_with(
            restrictive(),
            Method::OPTIONS,
            &[("origin", "https://app.example.com")],
        )
        .await;
        assert!(advanced);
    }

    #[tokio::test]
    async fn test_permissive_uses_wildcard_without_vary() {
        let (ctx, _) = run(Cors::permissive(), &[("origin", "https://anything.test")]).await;
        assert_eq!(ctx.response_header(headers::ALLOW_ORIGIN).as_deref(), Some("*"));
        assert!(ctx.response_header("vary").is_none());
    }

    #[test]
    fn test_allowed_origins() {
        assert!(AllowedOrigins::Any.is_allowed("https://x.test"));
        let list = AllowedOrigins::List(vec!["https://a.test".to_string()]);
        assert!(list.is_allowed("https://a.test"));
        assert!(!list.is_allowed("https://b.test"));
    }

    #[test]
    fn test_builder_dedupes() {
        let cors = Cors::builder()
            .allow_origin("https://a.test")
            .allow_origin("https://a.test")
            .allow_methods([Method::GET, Method::GET])
            .build();
        assert_eq!(
            cors.config().allowed_origins,
            AllowedOrigins::List(vec!["https://a.test".to_string()])
        );
        assert_eq!(cors.config().allowed_methods, vec![Method::GET]);
    }
}
