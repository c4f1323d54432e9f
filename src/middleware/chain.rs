use std::fmt;
use std::sync::Arc;

use super::Middleware;
use crate::dispatcher::{BoxedHandler, Handler, HandlerRequest, HandlerResponse};

/// Ordered list of middleware.
///
/// `then` builds the onion: the first layer added is the outermost, so it
/// sees the request first and the response last. Chains are immutable
/// values; [`append`](Chain::append) returns a new chain and leaves the
/// receiver untouched.
#[derive(Clone, Default)]
pub struct Chain {
    layers: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A new chain with `mw` added as the innermost layer.
    #[must_use]
    pub fn append<M: Middleware>(&self, mw: M) -> Chain {
        let mut next = self.clone();
        next.push(mw);
        next
    }

    /// Add `mw` as the innermost layer, in place.
    pub fn push<M: Middleware>(&mut self, mw: M) {
        self.layers.push(Arc::new(mw));
    }

    /// Add an already shared layer, in place.
    pub fn push_shared(&mut self, mw: Arc<dyn Middleware>) {
        self.layers.push(mw);
    }

    /// Concatenate chains, keeping each chain's order.
    ///
    /// `Chain::join([&a, &b]).then(h)` behaves like `a.then(b.then(h))`.
    pub fn join<'a, I>(chains: I) -> Chain
    where
        I: IntoIterator<Item = &'a Chain>,
    {
        let layers = chains
            .into_iter()
            .flat_map(|chain| chain.layers.iter().map(Arc::clone))
            .collect();
        Chain { layers }
    }

    /// Wrap `handler` in every layer, last layer innermost.
    pub fn then<H: Handler>(&self, handler: H) -> BoxedHandler {
        self.layers
            .iter()
            .rev()
            .fold(handler.into_boxed(), |next, layer| layer.wrap(next))
    }

    /// Same as [`then`](Chain::then), for a plain closure.
    pub fn then_fn<F>(&self, f: F) -> BoxedHandler
    where
        F: Fn(&mut HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        self.then(f)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// A chain nests inside another chain as a single layer.
impl Middleware for Chain {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        self.then(next)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("layers", &self.layers.len()).finish()
    }
}

/// Run `handlers` one after another on the same request.
///
/// Every handler sees the state left by the ones before it. The response of
/// the last handler is returned; an empty sequence answers `200` with no body.
pub fn sequence<I>(handlers: I) -> BoxedHandler
where
    I: IntoIterator<Item = BoxedHandler>,
{
    let handlers: Vec<BoxedHandler> = handlers.into_iter().collect();
    BoxedHandler::new(move |req: &mut HandlerRequest| -> HandlerResponse {
        handlers
            .iter()
            .fold(HandlerResponse::default(), |_, handler| handler.call(req))
    })
}
