//! Per-request context.
//!
//! A [`Context`] is created for every inbound request and owned by the task
//! serving it. It carries the request, the response under construction,
//! bound path parameters, request-scoped locals and the active
//! [`HandlerChain`].
//!
//! Query, cookie and body parsing are lazy and memoized: each is computed
//! at most once per request no matter how often its accessor is called.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::OnceLock;

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::request::Parts;
use http::{Method, Request, Response, StatusCode, Uri};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, StreamBody};
use hyper::body::{Body as HttpBody, Frame};
use serde::Serialize;
use url::Url;

use crate::body::{self, ParsedBody};
use crate::chain::HandlerChain;
use crate::cookie::{parse_cookie_header, SetCookie};
use crate::error::{BoxError, HermesError, HermesResult};
use crate::locals::Locals;
use crate::response::{Body, HttpResponse, ResponseBuilder};
use hermes_router::Params;

/// Body type of a request held by a [`Context`].
pub type RequestBody = UnsyncBoxBody<Bytes, BoxError>;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";
const OCTET_STREAM: &str = "application/octet-stream";

/// Mutable state for a single request.
///
/// # Example
///
/// ```rust
/// use hermes_core::Context;
/// use http::Request;
/// use http_body_util::Empty;
/// use bytes::Bytes;
///
/// let request = Request::get("/search?q=rust&page=2")
///     .body(Empty::<Bytes>::new())
///     .unwrap();
/// let mut ctx = Context::new(request, None);
///
/// assert_eq!(ctx.query("q"), Some("rust"));
/// assert_eq!(ctx.query("missing"), None);
///
/// ctx.status(201).unwrap().set("x-total", "2").unwrap();
/// assert_eq!(ctx.response().status(), 201);
/// ```
pub struct Context {
    parts: Parts,
    body: Option<RequestBody>,
    raw_body: Option<Bytes>,
    parsed_body: Option<ParsedBody>,
    params: Params,
    queries: OnceLock<HashMap<String, String>>,
    cookies: OnceLock<HashMap<String, String>>,
    locals: Option<Locals>,
    remote_addr: Option<SocketAddr>,
    response: ResponseBuilder,
    chain: HandlerChain,
}

impl Context {
    /// Creates a context for `request`.
    ///
    /// `remote_addr` is the peer address reported by the host server.
    pub fn new<B>(request: Request<B>, remote_addr: Option<SocketAddr>) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        let body = body.map_err(|e| -> BoxError { e.into() }).boxed_unsync();
        Self {
            parts,
            body: Some(body),
            raw_body: None,
            parsed_body: None,
            params: Params::new(),
            queries: OnceLock::new(),
            cookies: OnceLock::new(),
            locals: None,
            remote_addr,
            response: ResponseBuilder::new(),
            chain: HandlerChain::empty(),
        }
    }

    /// Creates a context for an empty `GET /` request.
    ///
    /// Handy for unit-testing handlers.
    #[must_use]
    pub fn empty() -> Self {
        let mut request = Request::new(Empty::<Bytes>::new());
        *request.uri_mut() = Uri::from_static("/");
        Self::new(request, None)
    }

    // ------------------------------------------------------------------
    // Request
    // ------------------------------------------------------------------

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn request_headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Returns the first value of a request header.
    ///
    /// Values that are not visible ASCII are treated as absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Alias of [`Context::get`].
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.get(name)
    }

    /// Returns the absolute request URL.
    ///
    /// Origin-form request targets are resolved against the `Host` header.
    pub fn url(&self) -> HermesResult<Url> {
        let uri = &self.parts.uri;
        let raw = if uri.scheme().is_some() && uri.authority().is_some() {
            uri.to_string()
        } else {
            let host = self.get(header::HOST.as_str()).unwrap_or("localhost");
            let target = uri.path_and_query().map_or("/", |pq| pq.as_str());
            format!("http://{host}{target}")
        };
        Url::parse(&raw).map_err(|e| HermesError::InvalidUrl(format!("{raw}: {e}")))
    }

    /// Returns the peer IP address, if the host server reported one.
    #[must_use]
    pub fn ip(&self) -> Option<IpAddr> {
        self.remote_addr.map(|addr| addr.ip())
    }

    /// Returns the peer socket address, if the host server reported one.
    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Returns a query-string value; the last occurrence of a key wins.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.queries().get(name).map(String::as_str)
    }

    /// Returns every query-string value, parsed once per request.
    #[must_use]
    pub fn queries(&self) -> &HashMap<String, String> {
        self.queries.get_or_init(|| {
            let query = self.parts.uri.query().unwrap_or_default();
            serde_urlencoded::from_str::<Vec<(String, String)>>(query)
                .unwrap_or_default()
                .into_iter()
                .collect()
        })
    }

    /// Returns a bound path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns every bound path parameter.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Binds the path parameters of the matched route.
    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    /// Returns a request cookie.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies().get(name).map(String::as_str)
    }

    /// Returns every request cookie, parsed once per request.
    ///
    /// Multiple `Cookie` headers are merged.
    #[must_use]
    pub fn cookies(&self) -> &HashMap<String, String> {
        self.cookies.get_or_init(|| {
            let joined: Vec<&str> = self
                .parts
                .headers
                .get_all(header::COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            parse_cookie_header(&joined.join("; "))
        })
    }

    /// Parses the request body according to its content type.
    ///
    /// `GET` and `HEAD` requests never have a body: `Ok(None)` is returned
    /// without touching the stream. Otherwise the stream is read once and the
    /// parsed value is memoized, so repeated calls return the same value.
    pub async fn body(&mut self) -> HermesResult<Option<&ParsedBody>> {
        if self.is_bodiless() {
            return Ok(None);
        }
        if self.parsed_body.is_none() {
            let raw = self.read_raw().await?;
            let content_type = self.get(header::CONTENT_TYPE.as_str()).map(str::to_string);
            let parsed = body::parse(content_type.as_deref(), raw)
                .await
                .map_err(|err| {
                    tracing::debug!(
                        content_type = content_type.as_deref().unwrap_or("-"),
                        error = %err,
                        "request body rejected"
                    );
                    err
                })?;
            self.parsed_body = Some(parsed);
        }
        Ok(self.parsed_body.as_ref())
    }

    /// Returns the raw request body bytes.
    ///
    /// Shares the single read with [`Context::body`]; empty for `GET`/`HEAD`.
    pub async fn raw_body(&mut self) -> HermesResult<Bytes> {
        if self.is_bodiless() {
            return Ok(Bytes::new());
        }
        self.read_raw().await
    }

    fn is_bodiless(&self) -> bool {
        self.parts.method == Method::GET || self.parts.method == Method::HEAD
    }

    async fn read_raw(&mut self) -> HermesResult<Bytes> {
        if let Some(raw) = &self.raw_body {
            return Ok(raw.clone());
        }
        let raw = match self.body.take() {
            Some(stream) => stream
                .collect()
                .await
                .map_err(|e| HermesError::BodyRead(e.to_string()))?
                .to_bytes(),
            None => Bytes::new(),
        };
        self.raw_body = Some(raw.clone());
        Ok(raw)
    }

    // ------------------------------------------------------------------
    // Response
    // ------------------------------------------------------------------

    /// Returns the response under construction.
    #[must_use]
    pub fn response(&self) -> &ResponseBuilder {
        &self.response
    }

    /// Returns the response under construction for direct manipulation.
    pub fn response_mut(&mut self) -> &mut ResponseBuilder {
        &mut self.response
    }

    /// Takes the response out of the context, leaving a fresh `200 OK`.
    pub fn take_response(&mut self) -> ResponseBuilder {
        std::mem::take(&mut self.response)
    }

    /// Returns a response with the current status and headers but no body.
    #[must_use]
    pub fn response_without_body(&self) -> HttpResponse {
        self.response.to_response_without_body()
    }

    /// Returns a response header; multiple values are joined with `", "`.
    #[must_use]
    pub fn response_header(&self, name: &str) -> Option<String> {
        self.response.header_joined(name)
    }

    /// Sets a response header, replacing any previous values.
    pub fn set(&mut self, name: &str, value: &str) -> HermesResult<&mut Self> {
        let (name, value) = header_pair(name, value)?;
        self.response.set_header(name, value);
        Ok(self)
    }

    /// Adds a value to a response header, keeping previous values.
    pub fn append(&mut self, name: &str, value: &str) -> HermesResult<&mut Self> {
        let (name, value) = header_pair(name, value)?;
        self.response.append_header(name, value);
        Ok(self)
    }

    /// Removes every value of a response header.
    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        self.response.headers_mut().remove(name);
        self
    }

    /// Appends a `Set-Cookie` header.
    pub fn set_cookie(&mut self, cookie: &SetCookie) -> HermesResult<&mut Self> {
        self.append(header::SET_COOKIE.as_str(), &cookie.to_string())
    }

    /// Sets the response status.
    ///
    /// Fails with [`HermesError::InvalidStatusCode`] outside 100-599.
    pub fn status(&mut self, code: u16) -> HermesResult<&mut Self> {
        let status = checked_status(code)?;
        self.response.set_status(status);
        Ok(self)
    }

    /// Serializes `data` as the JSON body.
    ///
    /// Every value goes through `serde_json`, so a `Value::String` or a unit
    /// enum variant comes out quoted. Use [`Context::json_str`] for a
    /// document that is already encoded.
    pub fn json<T>(&mut self, data: &T, status: Option<u16>) -> HermesResult<&mut Self>
    where
        T: Serialize + ?Sized,
    {
        let status = status.map(checked_status).transpose()?;
        let encoded = serde_json::to_vec(data)?;
        self.replace_body(
            Body::Full(Bytes::from(encoded)),
            status,
            HeaderValue::from_static(APPLICATION_JSON),
        );
        Ok(self)
    }

    /// Writes an already-encoded JSON document verbatim.
    pub fn json_str(
        &mut self,
        data: impl Into<String>,
        status: Option<u16>,
    ) -> HermesResult<&mut Self> {
        let status = status.map(checked_status).transpose()?;
        self.replace_body(
            Body::Full(Bytes::from(data.into())),
            status,
            HeaderValue::from_static(APPLICATION_JSON),
        );
        Ok(self)
    }

    /// Sets a text body (`text/plain; charset=utf-8` unless overridden).
    pub fn string(
        &mut self,
        data: impl Into<String>,
        status: Option<u16>,
        content_type: Option<&str>,
    ) -> HermesResult<&mut Self> {
        let status = status.map(checked_status).transpose()?;
        let content_type = content_type_value(content_type, TEXT_PLAIN)?;
        self.replace_body(Body::Full(Bytes::from(data.into())), status, content_type);
        Ok(self)
    }

    /// Sets an HTML body.
    pub fn html(
        &mut self,
        data: impl Into<String>,
        status: Option<u16>,
    ) -> HermesResult<&mut Self> {
        self.string(data, status, Some(TEXT_HTML))
    }

    /// Sets a binary body (`application/octet-stream` unless overridden).
    pub fn buffer(
        &mut self,
        data: impl Into<Bytes>,
        status: Option<u16>,
        content_type: Option<&str>,
    ) -> HermesResult<&mut Self> {
        let status = status.map(checked_status).transpose()?;
        let content_type = content_type_value(content_type, OCTET_STREAM)?;
        self.replace_body(Body::Full(data.into()), status, content_type);
        Ok(self)
    }

    /// Sets a streaming body (`application/octet-stream` unless overridden).
    pub fn stream<S, E>(
        &mut self,
        stream: S,
        status: Option<u16>,
        content_type: Option<&str>,
    ) -> HermesResult<&mut Self>
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let status = status.map(checked_status).transpose()?;
        let content_type = content_type_value(content_type, OCTET_STREAM)?;
        let frames = stream
            .map_ok(Frame::data)
            .map_err(|e| -> BoxError { e.into() });
        let body = StreamBody::new(frames).boxed_unsync();
        self.replace_body(Body::Stream(body), status, content_type);
        Ok(self)
    }

    /// Adopts a complete response.
    ///
    /// Its status and body win; its headers replace same-named headers set
    /// earlier, and its `Content-Type` (or lack of one) always wins.
    pub fn raw<B>(&mut self, response: Response<B>) -> &mut Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = response.into_parts();
        let body = body.map_err(|e| -> BoxError { e.into() }).boxed_unsync();
        let headers = self.response.headers_mut();
        headers.remove(header::CONTENT_TYPE);
        headers.extend(parts.headers);
        self.response.set_status(parts.status);
        let content_type = self.response.headers().get(header::CONTENT_TYPE).cloned();
        self.response.set_body(Body::Stream(body), content_type);
        self
    }

    /// Replaces the response with a redirect to `location`.
    ///
    /// `location` is resolved against the request URL. Only the `Location`
    /// header survives. `status` defaults to 302 and must be within 300-399.
    pub fn redirect(&mut self, location: &str, status: Option<u16>) -> HermesResult<&mut Self> {
        let code = status.unwrap_or(302);
        if !(300..=399).contains(&code) {
            return Err(HermesError::InvalidRedirectStatus(code));
        }
        let status = checked_status(code)?;
        let target = self
            .url()?
            .join(location)
            .map_err(|e| HermesError::InvalidRedirectLocation {
                location: location.to_string(),
                reason: e.to_string(),
            })?;
        let value = HeaderValue::from_str(target.as_str())
            .map_err(|e| HermesError::invalid_header(header::LOCATION.as_str(), e))?;

        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, value);
        self.response.replace(status, headers, Body::Empty);
        Ok(self)
    }

    fn replace_body(&mut self, body: Body, status: Option<StatusCode>, content_type: HeaderValue) {
        if let Some(status) = status {
            self.response.set_status(status);
        }
        self.response.set_body(body, Some(content_type));
    }

    // ------------------------------------------------------------------
    // Locals and chain
    // ------------------------------------------------------------------

    /// Returns the request-scoped locals, if any were stored.
    #[must_use]
    pub fn locals(&self) -> Option<&Locals> {
        self.locals.as_ref()
    }

    /// Returns the request-scoped locals, creating them on first use.
    pub fn locals_mut(&mut self) -> &mut Locals {
        self.locals.get_or_insert_with(Locals::new)
    }

    /// Returns a typed local value.
    #[must_use]
    pub fn local<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.locals.as_ref().and_then(Locals::get::<T>)
    }

    /// Stores a typed local value.
    pub fn set_local<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.locals_mut().insert(value);
        self
    }

    /// Lets the active chain continue with its next handler.
    ///
    /// Calling it again once the chain is exhausted has no effect.
    pub fn next(&mut self) -> &mut Self {
        self.chain.advance();
        self
    }

    /// Returns the active chain.
    #[must_use]
    pub fn chain(&self) -> &HandlerChain {
        &self.chain
    }

    /// Installs a new active chain, returning the previous one.
    pub fn replace_chain(&mut self, chain: HandlerChain) -> HandlerChain {
        std::mem::replace(&mut self.chain, chain)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("params", &self.params)
            .field("response", &self.response)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

fn checked_status(code: u16) -> HermesResult<StatusCode> {
    if !(100..=599).contains(&code) {
        return Err(HermesError::InvalidStatusCode(code));
    }
    StatusCode::from_u16(code).map_err(|_| HermesError::InvalidStatusCode(code))
}

fn header_pair(name: &str, value: &str) -> HermesResult<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| HermesError::invalid_header(name, e))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|e| HermesError::invalid_header(name, e))?;
    Ok((header_name, header_value))
}

fn content_type_value(
    content_type: Option<&str>,
    default: &'static str,
) -> HermesResult<HeaderValue> {
    match content_type {
        Some(value) => HeaderValue::from_str(value)
            .map_err(|e| HermesError::invalid_header(header::CONTENT_TYPE.as_str(), e)),
        None => Ok(HeaderValue::from_static(default)),
    }
}
