use std::sync::Arc;
use std::time::{Duration, Instant};

use super::Middleware;
use crate::dispatcher::{BoxedHandler, Handler, HandlerRequest, HandlerResponse};

/// Before/after callbacks around a handler.
///
/// Simpler than writing a full [`Middleware`] when a layer only needs to
/// inspect the request, optionally answer early, and look at the response.
/// Turn hooks into a layer with [`HookLayer`].
pub trait Hooks: Send + Sync + 'static {
    /// Return `Some` to answer without calling the rest of the chain.
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }

    /// Always runs, including after a short-circuit (with zero latency).
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}

/// Adapts [`Hooks`] into an onion layer.
pub struct HookLayer<H> {
    hooks: Arc<H>,
}

impl<H: Hooks> HookLayer<H> {
    pub fn new(hooks: H) -> Self {
        Self {
            hooks: Arc::new(hooks),
        }
    }

    pub fn from_arc(hooks: Arc<H>) -> Self {
        Self { hooks }
    }
}

impl<H: Hooks> Middleware for HookLayer<H> {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        let hooks = Arc::clone(&self.hooks);
        BoxedHandler::new(move |req: &mut HandlerRequest| -> HandlerResponse {
            if let Some(mut early) = hooks.before(req) {
                hooks.after(req, &mut early, Duration::ZERO);
                return early;
            }
            let start = Instant::now();
            let mut res = next.call(req);
            hooks.after(req, &mut res, start.elapsed());
            res
        })
    }
}
