use std::time::Instant;

use tracing::{field, info, info_span};

use super::Middleware;
use crate::dispatcher::{BoxedHandler, Handler, HandlerRequest, HandlerResponse};

/// Opens a `request` span around the rest of the chain and logs completion.
///
/// The span carries `method`, `path` and `request_id`; `status` and
/// `latency_us` are recorded on it once the response is known.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        BoxedHandler::new(move |req: &mut HandlerRequest| -> HandlerResponse {
            let span = info_span!(
                "request",
                method = %req.method,
                path = %req.path,
                request_id = %req.request_id,
                route = field::Empty,
                status = field::Empty,
                latency_us = field::Empty,
            );
            let _entered = span.enter();
            if let Some(route) = &req.route_pattern {
                span.record("route", &**route);
            }

            let start = Instant::now();
            let res = next.call(req);
            let latency_us = start.elapsed().as_micros() as u64;

            span.record("status", res.status);
            span.record("latency_us", latency_us);
            info!(
                status = res.status,
                latency_us = latency_us,
                "Request completed"
            );
            res
        })
    }
}
