use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{HookLayer, Hooks, Middleware};
use crate::dispatcher::{BoxedHandler, HandlerRequest, HandlerResponse};

#[derive(Default)]
struct Counters {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    by_status: DashMap<u16, AtomicUsize>,
    by_route: DashMap<Arc<str>, AtomicUsize>,
}

/// Request counters with Prometheus text rendering.
///
/// Clones share the same counters, so one instance can be installed on a
/// router and another handle kept for the `/metrics` endpoint.
///
/// Metrics collected:
/// - Total request count
/// - Average latency
/// - Responses per status code
/// - Requests per matched route pattern
#[derive(Clone, Default)]
pub struct MetricsMiddleware {
    counters: Arc<Counters>,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.counters.request_count.load(Ordering::Relaxed)
    }

    /// Mean processing time; zero before the first request.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count() as u64;
        if count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.counters.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    #[must_use]
    pub fn status_count(&self, status: u16) -> usize {
        self.counters
            .by_status
            .get(&status)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn route_count(&self, pattern: &str) -> usize {
        self.counters
            .by_route
            .get(pattern)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Prometheus text exposition of all counters.
    #[must_use]
    pub fn render_prometheus(&self) -> String {
        let mut output = String::with_capacity(1024);

        output.push_str("# HELP ionrouter_requests_total Total number of handled requests\n");
        output.push_str("# TYPE ionrouter_requests_total counter\n");
        output.push_str(&format!("ionrouter_requests_total {}\n", self.request_count()));

        output.push_str(
            "# HELP ionrouter_request_latency_seconds Average request latency in seconds\n",
        );
        output.push_str("# TYPE ionrouter_request_latency_seconds gauge\n");
        output.push_str(&format!(
            "ionrouter_request_latency_seconds {}\n",
            self.average_latency().as_secs_f64()
        ));

        let mut statuses: Vec<(u16, usize)> = self
            .counters
            .by_status
            .iter()
            .map(|e| (*e.key(), e.value().load(Ordering::Relaxed)))
            .collect();
        if !statuses.is_empty() {
            statuses.sort_unstable();
            output.push_str("# HELP ionrouter_responses_total Responses by status code\n");
            output.push_str("# TYPE ionrouter_responses_total counter\n");
            for (status, count) in statuses {
                output.push_str(&format!(
                    "ionrouter_responses_total{{status=\"{status}\"}} {count}\n"
                ));
            }
        }

        let mut routes: Vec<(Arc<str>, usize)> = self
            .counters
            .by_route
            .iter()
            .map(|e| (Arc::clone(e.key()), e.value().load(Ordering::Relaxed)))
            .collect();
        if !routes.is_empty() {
            routes.sort_unstable();
            output.push_str("# HELP ionrouter_route_requests_total Requests by route pattern\n");
            output.push_str("# TYPE ionrouter_route_requests_total counter\n");
            for (route, count) in routes {
                output.push_str(&format!(
                    "ionrouter_route_requests_total{{route=\"{}\"}} {count}\n",
                    escape_label(&route)
                ));
            }
        }

        output
    }
}

impl Hooks for MetricsMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        self.counters.request_count.fetch_add(1, Ordering::Relaxed);
        if let Some(route) = &req.route_pattern {
            bump(&self.counters.by_route, Arc::clone(route));
        }
        None
    }

    fn after(&self, _req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        self.counters
            .total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        bump(&self.counters.by_status, res.status);
    }
}

impl Middleware for MetricsMiddleware {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        HookLayer::new(self.clone()).wrap(next)
    }
}

// Read lock on the hot path; the write lock is only taken for a new key.
fn bump<K: Eq + Hash>(map: &DashMap<K, AtomicUsize>, key: K) {
    if let Some(counter) = map.get(&key) {
        counter.fetch_add(1, Ordering::Relaxed);
        return;
    }
    map.entry(key).or_default().fetch_add(1, Ordering::Relaxed);
}

fn escape_label(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Handler;
    use crate::middleware::Chain;
    use http::Method;

    #[test]
    fn test_counts_requests_and_statuses() {
        let metrics = MetricsMiddleware::new();
        let h = Chain::new()
            .append(metrics.clone())
            .then_fn(|req: &mut HandlerRequest| {
                if req.path == "/missing" {
                    HandlerResponse::not_found()
                } else {
                    HandlerResponse::text(200, "ok")
                }
            });

        for path in ["/a", "/b", "/missing"] {
            let mut req = HandlerRequest::new(Method::GET, path);
            req.route_pattern = Some(Arc::from("/:x"));
            h.call(&mut req);
        }

        assert_eq!(metrics.request_count(), 3);
        assert_eq!(metrics.status_count(200), 2);
        assert_eq!(metrics.status_count(404), 1);
        assert_eq!(metrics.status_count(500), 0);
        assert_eq!(metrics.route_count("/:x"), 3);
    }

    #[test]
    fn test_render_prometheus() {
        let metrics = MetricsMiddleware::new();
        let h = Chain::new()
            .append(metrics.clone())
            .then_fn(|_req: &mut HandlerRequest| HandlerResponse::text(201, "made"));
        let mut req = HandlerRequest::new(Method::POST, "/things");
        req.route_pattern = Some(Arc::from("/things"));
        h.call(&mut req);

        let text = metrics.render_prometheus();
        assert!(text.contains("ionrouter_requests_total 1\n"));
        assert!(text.contains("ionrouter_responses_total{status=\"201\"} 1\n"));
        assert!(text.contains("ionrouter_route_requests_total{route=\"/things\"} 1\n"));
    }

    #[test]
    fn test_average_latency_zero_when_idle() {
        assert_eq!(MetricsMiddleware::new().average_latency(), Duration::ZERO);
    }
}
