//! Security headers.
//!
//! [`Helmet`] sets a fixed list of response headers before letting the
//! chain continue. Handlers further down may still override any of them.

use std::time::Duration;

use hermes_core::{BoxFuture, Context, Handler, HandlerResult};
use http::header::{HeaderName, HeaderValue};

/// `X-Frame-Options` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOptions {
    /// Never render in a frame.
    Deny,
    /// Only frames of the same origin.
    SameOrigin,
}

impl FrameOptions {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Deny => "DENY",
            Self::SameOrigin => "SAMEORIGIN",
        }
    }
}

/// Sets security headers on every response.
///
/// ```rust
/// use std::time::Duration;
/// use hermes_middleware::{FrameOptions, Helmet};
///
/// let helmet = Helmet::new()
///     .frame_options(FrameOptions::Deny)
///     .hsts(Duration::from_secs(31_536_000), true, true)
///     .without("x-dns-prefetch-control");
///
/// assert!(helmet.headers().iter().any(|(name, _)| name == "x-frame-options"));
/// ```
#[derive(Debug, Clone)]
pub struct Helmet {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl Default for Helmet {
    fn default() -> Self {
        let defaults: [(&'static str, &'static str); 11] = [
            ("content-security-policy", "default-src 'self'; base-uri 'self'; font-src 'self' https: data:; form-action 'self'; frame-ancestors 'self'; img-src 'self' data:; object-src 'none'; script-src 'self'; script-src-attr 'none'; style-src 'self' https: 'unsafe-inline'; upgrade-insecure-requests"),
            ("cross-origin-opener-policy", "same-origin"),
            ("cross-origin-resource-policy", "same-origin"),
            ("origin-agent-cluster", "?1"),
            ("referrer-policy", "no-referrer"),
            ("strict-transport-security", "max-age=15552000; includeSubDomains"),
            ("x-content-type-options", "nosniff"),
            ("x-dns-prefetch-control", "off"),
            ("x-frame-options", FrameOptions::SameOrigin.as_str()),
            ("x-permitted-cross-domain-policies", "none"),
            ("x-xss-protection", "0"),
        ];
        Self {
            headers: defaults
                .into_iter()
                .map(|(name, value)| {
                    (HeaderName::from_static(name), HeaderValue::from_static(value))
                })
                .collect(),
        }
    }
}

impl Helmet {
    /// Creates the default header set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or replaces a header.
    #[must_use]
    pub fn with(mut self, name: HeaderName, value: HeaderValue) -> Self {
        match self.headers.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Drops a header from the set.
    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.headers.retain(|(n, _)| !n.as_str().eq_ignore_ascii_case(name));
        self
    }

    /// Sets `X-Frame-Options`.
    #[must_use]
    pub fn frame_options(self, option: FrameOptions) -> Self {
        self.with(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static(option.as_str()),
        )
    }

    /// Sets `Strict-Transport-Security`.
    #[must_use]
    pub fn hsts(self, max_age: Duration, include_subdomains: bool, preload: bool) -> Self {
        let mut value = format!("max-age={}", max_age.as_secs());
        if include_subdomains {
            value.push_str("; includeSubDomains");
        }
        if preload {
            value.push_str("; preload");
        }
        match HeaderValue::from_str(&value) {
            Ok(v) => self.with(HeaderName::from_static("strict-transport-security"), v),
            Err(_) => self,
        }
    }

    /// Sets `Content-Security-Policy`. Returns `self` unchanged for an invalid value.
    #[must_use]
    pub fn content_security_policy(self, policy: &str) -> Self {
        match HeaderValue::from_str(policy) {
            Ok(v) => self.with(HeaderName::from_static("content-security-policy"), v),
            Err(_) => {
                tracing::warn!(policy, "Ignoring invalid Content-Security-Policy");
                self
            }
        }
    }

    /// Returns the configured headers in order.
    #[must_use]
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }
}

impl Handler for Helmet {
    fn name(&self) -> &'static str {
        "helmet"
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let response = ctx.response_mut();
            for (name, value) in &self.headers {
                response.set_header(name.clone(), value.clone());
            }
            ctx.next();
            Ok(())
        })
    }
}
