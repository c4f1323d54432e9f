use crate::dispatcher::BoxedHandler;

/// Onion layer: wraps the next handler and returns a new one.
///
/// The returned handler decides whether and when to call `next`; code placed
/// before the call runs on the way in, code after it on the way out. Not
/// calling `next` short-circuits everything further in.
///
/// Any `Fn(BoxedHandler) -> BoxedHandler` closure is a middleware.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

impl<F> Middleware for F
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        self(next)
    }
}
