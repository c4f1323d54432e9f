//! # Application Facade
//!
//! [`App`] shares one [`Router`] behind a read/write lock so routes and
//! middleware can be added while requests are being served. Each dispatch
//! holds the read lock only while it matches the request and composes the
//! chain; the handler itself runs without the lock, so a slow handler never
//! blocks registration.
//!
//! Nothing inside the router depends on this module. Code that prefers a
//! process-wide instance can use [`default_app`]; everything else should own
//! its `App` (or a plain `Router`) explicitly.
//!
//! ```rust
//! use ionrouter::app::App;
//! use ionrouter::dispatcher::{HandlerRequest, HandlerResponse};
//! use http::Method;
//!
//! let app = App::new();
//! let serving = app.clone();
//!
//! app.get("/ping", |_req: &mut HandlerRequest| HandlerResponse::text(200, "pong"), None)?;
//! assert_eq!(serving.handle(Method::GET, "/ping").body_text(), Some("pong"));
//! # Ok::<(), ionrouter::error::RouterError>(())
//! ```

use http::Method;
use once_cell::sync::Lazy;
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;
use tracing::info;

use crate::config::RouterConfig;
use crate::dispatcher::{Handler, HandlerRequest, HandlerResponse};
use crate::error::RouterError;
use crate::middleware::Middleware;
use crate::router::{RouteHandle, RouteMatch, Router};
use crate::state::StateContainer;

static DEFAULT_APP: Lazy<App> = Lazy::new(|| {
    let config = RouterConfig::from_env();
    info!(config = ?config, "Default app created");
    App::with_config(config)
});

/// Process-wide app, created on first use with [`RouterConfig::from_env`].
pub fn default_app() -> &'static App {
    &DEFAULT_APP
}

/// Cloneable handle to a shared, hot-registrable router.
#[derive(Clone, Debug)]
pub struct App {
    router: Arc<RwLock<Router>>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self::from_router(Router::new())
    }

    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        Self::from_router(Router::with_config(config))
    }

    #[must_use]
    pub fn from_router(router: Router) -> Self {
        Self {
            router: Arc::new(RwLock::new(router)),
        }
    }

    /// Register a route; requests dispatched after this returns can match it.
    pub fn register<H: Handler>(
        &self,
        method: Method,
        pattern: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<RouteHandle, RouterError> {
        self.router.write().register(method, pattern, handler, name)
    }

    pub fn get<H: Handler>(
        &self,
        pattern: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<RouteHandle, RouterError> {
        self.register(Method::GET, pattern, handler, name)
    }

    pub fn post<H: Handler>(
        &self,
        pattern: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<RouteHandle, RouterError> {
        self.register(Method::POST, pattern, handler, name)
    }

    pub fn put<H: Handler>(
        &self,
        pattern: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<RouteHandle, RouterError> {
        self.register(Method::PUT, pattern, handler, name)
    }

    pub fn patch<H: Handler>(
        &self,
        pattern: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<RouteHandle, RouterError> {
        self.register(Method::PATCH, pattern, handler, name)
    }

    pub fn delete<H: Handler>(
        &self,
        pattern: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<RouteHandle, RouterError> {
        self.register(Method::DELETE, pattern, handler, name)
    }

    pub fn options<H: Handler>(
        &self,
        pattern: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<RouteHandle, RouterError> {
        self.register(Method::OPTIONS, pattern, handler, name)
    }

    /// Append a layer; applies to requests prepared after this returns.
    pub fn use_middleware<M: Middleware>(&self, mw: M) {
        self.router.write().use_middleware(mw);
    }

    pub fn dispatch(&self, mut req: HandlerRequest) -> HandlerResponse {
        let (_scope, handler) = self.router.read().prepare(&mut req);
        match handler {
            Some(handler) => handler.call(&mut req),
            None => HandlerResponse::not_found(),
        }
    }

    pub fn handle(&self, method: Method, target: &str) -> HandlerResponse {
        self.dispatch(HandlerRequest::new(method, target))
    }

    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.router.read().match_route(method, path)
    }

    #[must_use]
    pub fn reverse_route(&self, name: &str, args: &[&str]) -> String {
        self.router.read().reverse_route(name, args)
    }

    #[must_use]
    pub fn route_count(&self) -> usize {
        self.router.read().route_count()
    }

    #[must_use]
    pub fn state(&self) -> Arc<StateContainer> {
        Arc::clone(self.router.read().state())
    }

    /// Read access to the router, for inspection. Registration waits while
    /// the guard is held.
    pub fn router(&self) -> RwLockReadGuard<'_, Router> {
        self.router.read()
    }

    /// Destroy scoped state older than the configured TTL.
    ///
    /// Returns the number of entries reclaimed; always zero when
    /// `state_ttl_secs` is unset.
    pub fn sweep_expired_state(&self) -> usize {
        let router = self.router.read();
        match router.config().state_ttl() {
            Some(ttl) => router.state().sweep_older_than(ttl),
            None => 0,
        }
    }
}
