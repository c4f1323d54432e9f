//! Router core: route table, matching, reversal and dispatch.

use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::pattern::{split_path, ParamVec, PathParams, PathPattern};
use crate::config::{DuplicateNamePolicy, RouterConfig};
use crate::dispatcher::{BoxedHandler, Handler, HandlerRequest, HandlerResponse};
use crate::error::RouterError;
use crate::middleware::{Chain, Middleware};
use crate::state::{StateContainer, StateScope};

/// Methods that can carry routes.
pub const ROUTABLE_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// A registered route.
pub struct Route {
    method: Method,
    pattern: PathPattern,
    handler: BoxedHandler,
    name: Option<Arc<str>>,
}

impl Route {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    #[must_use]
    pub fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("name", &self.name)
            .finish()
    }
}

/// Returned by [`Router::register`]; identifies the new route.
#[derive(Debug, Clone)]
pub struct RouteHandle {
    route: Arc<Route>,
    index: usize,
}

impl RouteHandle {
    #[must_use]
    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    /// Position among the routes of the same method. Lower wins.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.route.method
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        self.route.pattern.as_str()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.route.name()
    }
}

/// Result of successfully matching a request path to a route
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route
    pub route: Arc<Route>,
    /// One binding per variable segment, in pattern order
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name ("last write wins" on duplicate names)
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to a HashMap. Allocates.
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Ordered method + path router.
///
/// Routes are tried in registration order within their method; the first
/// pattern that matches wins. Matching and dispatch take `&self`, so a built
/// router can be shared across threads. Registering while serving goes
/// through [`App`](crate::app::App).
///
/// ```rust
/// use ionrouter::dispatcher::{HandlerRequest, HandlerResponse};
/// use ionrouter::router::Router;
/// use http::Method;
///
/// let mut router = Router::new();
/// router.get("/users/:id", |req: &mut HandlerRequest| {
///     let id = req.path_param("id").unwrap_or_default();
///     HandlerResponse::text(200, format!("user {id}"))
/// }, Some("user"))?;
///
/// assert_eq!(router.reverse_route("user", &["id", "7"]), "/users/7");
/// let res = router.handle(Method::GET, "/users/7");
/// assert_eq!(res.body_text(), Some("user 7"));
/// # Ok::<(), ionrouter::error::RouterError>(())
/// ```
#[derive(Clone)]
pub struct Router {
    routes: HashMap<Method, Vec<Arc<Route>>>,
    names: HashMap<Arc<str>, Arc<Route>>,
    chain: Chain,
    state: Arc<StateContainer>,
    config: RouterConfig,
    path_params_key: Arc<str>,
    slow_match_threshold: Duration,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        Self::with_state(config, Arc::new(StateContainer::new()))
    }

    /// Build a router that allocates request state in `state`.
    #[must_use]
    pub fn with_state(config: RouterConfig, state: Arc<StateContainer>) -> Self {
        Self {
            routes: HashMap::new(),
            names: HashMap::new(),
            chain: Chain::new(),
            state,
            path_params_key: Arc::from(config.path_params_key.as_str()),
            slow_match_threshold: config.slow_match_threshold(),
            config,
        }
    }

    /// Add a route.
    ///
    /// The pattern is parsed here, once. The new route is tried after every
    /// route already registered for `method`.
    pub fn register<H: Handler>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<RouteHandle, RouterError> {
        if !ROUTABLE_METHODS.contains(&method) {
            return Err(RouterError::UnsupportedMethod { method });
        }
        let pattern = PathPattern::parse(pattern)?;

        if let Some(name) = name {
            if let Some(existing) = self.names.get(name) {
                match self.config.duplicate_names {
                    DuplicateNamePolicy::Reject => {
                        return Err(RouterError::DuplicateRouteName {
                            name: name.to_string(),
                            existing_pattern: existing.pattern.as_str().to_string(),
                        });
                    }
                    DuplicateNamePolicy::Overwrite => {
                        warn!(
                            route_name = %name,
                            old_method = %existing.method,
                            old_pattern = %existing.pattern,
                            new_method = %method,
                            new_pattern = %pattern,
                            "Route name reassigned"
                        );
                    }
                }
            }
        }

        let route = Arc::new(Route {
            method: method.clone(),
            pattern,
            handler: handler.into_boxed(),
            name: name.map(Arc::from),
        });
        if let Some(name) = &route.name {
            self.names.insert(Arc::clone(name), Arc::clone(&route));
        }

        let table = self.routes.entry(method).or_default();
        let index = table.len();
        table.push(Arc::clone(&route));

        debug!(
            method = %route.method,
            pattern = %route.pattern,
            route_name = ?route.name,
            index = index,
            "Route registered"
        );

        Ok(RouteHandle { route, index })
    }

    pub fn get<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<RouteHandle, RouterError> {
        self.register(Method::GET, pattern, handler, name)
    }

    pub fn post<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<RouteHandle, RouterError> {
        self.register(Method::POST, pattern, handler, name)
    }

    pub fn put<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<RouteHandle, RouterError> {
        self.register(Method::PUT, pattern, handler, name)
    }

    pub fn patch<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<RouteHandle, RouterError> {
        self.register(Method::PATCH, pattern, handler, name)
    }

    pub fn delete<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<RouteHandle, RouterError> {
        self.register(Method::DELETE, pattern, handler, name)
    }

    pub fn options<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<RouteHandle, RouterError> {
        self.register(Method::OPTIONS, pattern, handler, name)
    }

    /// Append a layer to the chain wrapped around every matched handler.
    pub fn use_middleware<M: Middleware>(&mut self, mw: M) {
        self.chain.push(mw);
    }

    #[must_use]
    pub fn middleware(&self) -> &Chain {
        &self.chain
    }

    #[must_use]
    pub fn state(&self) -> &Arc<StateContainer> {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Routes for `method` in match order.
    #[must_use]
    pub fn routes(&self, method: &Method) -> &[Arc<Route>] {
        self.routes
            .get(method)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn route_by_name(&self, name: &str) -> Option<&Arc<Route>> {
        self.names.get(name)
    }

    /// Log every registered route at INFO.
    pub fn dump_routes(&self) {
        info!(
            routes_count = self.route_count(),
            named_routes = self.names.len(),
            "Routing table"
        );
        for method in &ROUTABLE_METHODS {
            for (index, route) in self.routes(method).iter().enumerate() {
                info!(
                    method = %method,
                    pattern = %route.pattern,
                    route_name = ?route.name,
                    index = index,
                    "Route"
                );
            }
        }
    }

    /// Find the first route for `method` whose pattern matches `path`.
    ///
    /// A query string is ignored. Returns `None` when nothing matches,
    /// including for methods that cannot carry routes.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        debug!(method = %method, path = %path, "Route match attempt");

        let match_start = Instant::now();
        let path = path.split_once('?').map_or(path, |(path, _)| path);
        let result = self.find(method, path);
        let match_duration = match_start.elapsed();

        match &result {
            Some(found) if match_duration > self.slow_match_threshold => {
                warn!(
                    method = %method,
                    path = %path,
                    route_pattern = %found.route.pattern,
                    duration_us = match_duration.as_micros() as u64,
                    candidates = self.routes(method).len(),
                    "Slow route matching detected"
                );
            }
            Some(found) => {
                info!(
                    method = %method,
                    path = %path,
                    route_pattern = %found.route.pattern,
                    route_name = ?found.route.name,
                    path_params = ?found.path_params,
                    duration_us = match_duration.as_micros() as u64,
                    "Route matched"
                );
            }
            None => {
                warn!(
                    method = %method,
                    path = %path,
                    duration_us = match_duration.as_micros() as u64,
                    "No route matched"
                );
            }
        }

        result
    }

    fn find(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let segments = split_path(path)?;
        self.routes.get(method)?.iter().find_map(|route| {
            route
                .pattern
                .match_segments(&segments)
                .map(|path_params| RouteMatch {
                    route: Arc::clone(route),
                    path_params,
                })
        })
    }

    /// Build a path for the route registered under `name`.
    ///
    /// `args` alternates variable names (without the sigil) and values.
    /// A key given twice takes its first value. Returns an empty string when
    /// the name is unknown, the argument count is odd, or any variable is
    /// left without a value. An empty value counts as missing.
    #[must_use]
    pub fn reverse_route(&self, name: &str, args: &[&str]) -> String {
        let Some(route) = self.names.get(name) else {
            debug!(route_name = %name, "Reverse routing: unknown name");
            return String::new();
        };
        route.pattern.reverse(args).unwrap_or_else(|| {
            debug!(
                route_name = %name,
                pattern = %route.pattern,
                args = args.len(),
                "Reverse routing: arguments do not fill the pattern"
            );
            String::new()
        })
    }

    /// Bind `req` to fresh scoped state, match it, store the bindings and
    /// compose the chain around the matched handler.
    ///
    /// The returned scope must outlive the handler call.
    pub(crate) fn prepare(&self, req: &mut HandlerRequest) -> (StateScope, Option<BoxedHandler>) {
        let scope = self.state.scope();
        req.set_state(scope.request_state());
        req.set_path_params_key(Arc::clone(&self.path_params_key));

        let Some(found) = self.match_route(&req.method, &req.path) else {
            return (scope, None);
        };

        req.route_pattern = Some(found.route.pattern.raw());
        req.route_name = found.route.name.clone();
        req.state()
            .set(&*self.path_params_key, PathParams::from(found.path_params));

        let handler = self.chain.then(found.route.handler.clone());
        (scope, Some(handler))
    }

    /// Route `req`, run the chain and handler, release scoped state.
    ///
    /// Unmatched requests get a `404` JSON response and never reach the
    /// chain. State is destroyed even if the handler panics.
    pub fn dispatch(&self, mut req: HandlerRequest) -> HandlerResponse {
        let (_scope, handler) = self.prepare(&mut req);
        match handler {
            Some(handler) => handler.call(&mut req),
            None => HandlerResponse::not_found(),
        }
    }

    /// Dispatch a bare `method` + `/path?query` request.
    pub fn handle(&self, method: Method, target: &str) -> HandlerResponse {
        self.dispatch(HandlerRequest::new(method, target))
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.route_count())
            .field("named", &self.names.len())
            .field("middleware", &self.chain.len())
            .field("config", &self.config)
            .finish()
    }
}
