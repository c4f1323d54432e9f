use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::error;

use super::Middleware;
use crate::dispatcher::{BoxedHandler, Handler, HandlerRequest, HandlerResponse};

/// Turns a panic anywhere further in into a `500` response.
///
/// Place it first in the chain so it also covers the other layers. Scoped
/// state is released by the router whether or not this layer is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryMiddleware;

impl Middleware for RecoveryMiddleware {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        BoxedHandler::new(move |req: &mut HandlerRequest| -> HandlerResponse {
            match catch_unwind(AssertUnwindSafe(|| next.call(req))) {
                Ok(res) => res,
                Err(panic) => {
                    let panic_message = panic_message(panic.as_ref());
                    error!(
                        request_id = %req.request_id,
                        method = %req.method,
                        path = %req.path,
                        route = ?req.route_pattern,
                        panic_message = %panic_message,
                        "Handler panicked"
                    );
                    HandlerResponse::error(500, "Internal Server Error")
                }
            }
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
