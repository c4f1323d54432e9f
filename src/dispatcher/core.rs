//! Request, response and handler types shared by the router, the middleware
//! chain and the state container.

use http::Method;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ids::RequestId;
use crate::router::{ParamVec, PathParams};
use crate::state::RequestState;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage.
///
/// Header names use `Arc<str>` because the same few names repeat on every
/// request; values are per-request `String`s.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Default scoped-state key for path bindings.
pub const DEFAULT_PATH_PARAMS_KEY: &str = "path";

/// Request data passed through the middleware chain to a handler.
///
/// Path bindings are not a field: the router writes them into the request's
/// scoped state, and [`path_param`](HandlerRequest::path_param) reads them
/// back from there.
#[derive(Debug)]
pub struct HandlerRequest {
    /// Correlation id for logs
    pub request_id: RequestId,
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Query string parameters (stack-allocated for ≤8 params)
    pub query_params: ParamVec,
    /// HTTP headers (stack-allocated for ≤16 headers)
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
    /// Pattern of the matched route, set by the router
    pub route_pattern: Option<Arc<str>>,
    /// Name of the matched route, if it has one
    pub route_name: Option<Arc<str>>,
    path_params_key: Arc<str>,
    state: RequestState,
}

impl HandlerRequest {
    /// Build a request from a method and a request target (`/path?query`).
    ///
    /// The request gets private scoped state; the router re-binds it to its
    /// own container on dispatch.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            query_params: query.map(parse_query_params).unwrap_or_default(),
            headers: HeaderVec::new(),
            body: None,
            route_pattern: None,
            route_name: None,
            path_params_key: Arc::from(DEFAULT_PATH_PARAMS_KEY),
            state: RequestState::detached(),
        }
    }

    /// Add a header. Names are stored lowercase; an `x-request-id` header
    /// also becomes the correlation id when it is a valid ULID.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        if name == "x-request-id" {
            self.request_id = RequestId::from_header_or_new(Some(&value));
        }
        self.headers.push((Arc::from(name), value));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The request's scoped key/value state.
    #[must_use]
    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub(crate) fn set_state(&mut self, state: RequestState) {
        self.state = state;
    }

    pub(crate) fn set_path_params_key(&mut self, key: Arc<str>) {
        self.path_params_key = key;
    }

    /// All path bindings of the matched route.
    #[must_use]
    pub fn path_params(&self) -> Option<Arc<PathParams>> {
        self.state.get::<PathParams>(&self.path_params_key)
    }

    /// A single path binding, by variable name without the sigil.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<String> {
        self.path_params()
            .and_then(|params| params.get(name).map(str::to_string))
    }

    /// Get a query parameter by name ("last write wins" on duplicates)
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Convert headers to a HashMap. Allocates.
    #[must_use]
    pub fn headers_map(&self) -> HashMap<String, String> {
        self.headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Parse a raw query string (without the leading `?`), URL-decoding names
/// and values.
#[must_use]
pub fn parse_query_params(query: &str) -> ParamVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::<str>::from(&*k), v.into_owned()))
        .collect()
}

/// Response produced by a handler or a short-circuiting middleware.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body; strings are sent as text, everything else as JSON
    pub body: Value,
}

impl Default for HandlerResponse {
    fn default() -> Self {
        Self::new(200, HeaderVec::new(), Value::Null)
    }
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with a content-type header
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a plain-text response
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "text/plain".to_string()));
        Self {
            status,
            headers,
            body: Value::String(body.into()),
        }
    }

    /// Create an error response: `{"error": message}`
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::error(404, "Not Found")
    }

    /// Append text to a string body (a null body becomes empty text first).
    pub fn push_text(&mut self, text: &str) {
        if self.body.is_null() {
            self.body = Value::String(String::new());
        }
        match &mut self.body {
            Value::String(s) => s.push_str(text),
            other => {
                let prev = other.to_string();
                *other = Value::String(prev + text);
            }
        }
    }

    /// Body as text, if it is a string
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_str()
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Anything that turns a request into a response.
///
/// Closures `Fn(&mut HandlerRequest) -> HandlerResponse` implement it.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: &mut HandlerRequest) -> HandlerResponse;

    /// Type-erase into a [`BoxedHandler`]. Already boxed handlers are
    /// returned as is.
    fn into_boxed(self) -> BoxedHandler
    where
        Self: Sized,
    {
        BoxedHandler(Arc::new(self))
    }
}

impl<F> Handler for F
where
    F: Fn(&mut HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
{
    fn call(&self, req: &mut HandlerRequest) -> HandlerResponse {
        self(req)
    }
}

/// Shared, type-erased handler. Cheap to clone.
#[derive(Clone)]
pub struct BoxedHandler(Arc<dyn Handler>);

impl BoxedHandler {
    pub fn new<H: Handler>(h: H) -> Self {
        Self(Arc::new(h))
    }

    /// Whether both values wrap the same handler instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &BoxedHandler) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Handler for BoxedHandler {
    fn call(&self, req: &mut HandlerRequest) -> HandlerResponse {
        self.0.call(req)
    }

    fn into_boxed(self) -> BoxedHandler {
        self
    }
}

impl fmt::Debug for BoxedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoxedHandler")
    }
}

/// Box a closure or handler value.
pub fn handler<H: Handler>(h: H) -> BoxedHandler {
    h.into_boxed()
}
