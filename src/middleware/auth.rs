use std::sync::Arc;
use tracing::warn;

use super::{HookLayer, Hooks, Middleware};
use crate::dispatcher::{BoxedHandler, HandlerRequest, HandlerResponse};

/// Rejects requests whose `authorization` header does not equal a static
/// token, answering `401` without running the handler.
#[derive(Debug, Clone)]
pub struct AuthMiddleware {
    token: Arc<str>,
}

impl AuthMiddleware {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Hooks for AuthMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        match req.get_header("authorization") {
            Some(h) if h == &*self.token => None,
            provided => {
                warn!(
                    request_id = %req.request_id,
                    method = %req.method,
                    path = %req.path,
                    header_present = provided.is_some(),
                    "Authorization failed"
                );
                Some(HandlerResponse::error(401, "Unauthorized"))
            }
        }
    }
}

impl Middleware for AuthMiddleware {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        HookLayer::new(self.clone()).wrap(next)
    }
}
