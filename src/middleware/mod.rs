//! # Middleware Module
//!
//! Onion-style composition around handlers.
//!
//! A [`Middleware`] takes the next handler and returns a handler that wraps
//! it. A [`Chain`] is an ordered list of them; `chain.then(handler)` applies
//! the list so that the first layer is outermost:
//!
//! ```text
//! request  ->  A  ->  B  ->  handler
//! response <-  A  <-  B  <-
//! ```
//!
//! Short-circuiting is simply not calling `next`. There is no error channel:
//! a layer answers with a response or lets a panic unwind to
//! [`RecoveryMiddleware`].
//!
//! Layers that only need before/after callbacks implement [`Hooks`] and are
//! installed through [`HookLayer`].
//!
//! ## Stock Middleware
//!
//! - [`TracingMiddleware`]: request span and completion event
//! - [`MetricsMiddleware`]: counters with Prometheus text output
//! - [`RecoveryMiddleware`]: panic to `500`
//! - [`AuthMiddleware`]: static token check, `401` on mismatch
//!
//! ## Example
//!
//! ```rust
//! use ionrouter::dispatcher::{BoxedHandler, Handler, HandlerRequest, HandlerResponse};
//! use ionrouter::middleware::{Chain, RecoveryMiddleware};
//! use http::Method;
//!
//! let timing = |next: BoxedHandler| {
//!     BoxedHandler::new(move |req: &mut HandlerRequest| -> HandlerResponse {
//!         let mut res = next.call(req);
//!         res.set_header("x-served-by", "ionrouter".to_string());
//!         res
//!     })
//! };
//!
//! let app = Chain::new()
//!     .append(RecoveryMiddleware)
//!     .append(timing)
//!     .then_fn(|_req: &mut HandlerRequest| HandlerResponse::text(200, "ok"));
//!
//! let res = app.call(&mut HandlerRequest::new(Method::GET, "/"));
//! assert_eq!(res.get_header("x-served-by"), Some("ionrouter"));
//! ```

mod auth;
mod chain;
mod core;
mod hooks;
mod metrics;
mod recovery;
mod tracing;

pub use auth::AuthMiddleware;
pub use chain::{sequence, Chain};
pub use core::Middleware;
pub use hooks::{HookLayer, Hooks};
pub use metrics::MetricsMiddleware;
pub use recovery::RecoveryMiddleware;
pub use tracing::TracingMiddleware;
