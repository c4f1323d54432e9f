//! # ionrouter
//!
//! **ionrouter** is a small HTTP request-dispatch library: it selects a
//! handler for a method and path, extracts `:name` variables from the path,
//! gives every in-flight request its own key/value state, and composes
//! middleware around handlers onion-style.
//!
//! It does not own a socket. A server hands it a [`HandlerRequest`] and
//! writes back the [`HandlerResponse`] it returns.
//!
//! ## Architecture
//!
//! - **[`router`]** - Ordered method + path matching and named-route reversal
//! - **[`state`]** - Request-scoped state container with guaranteed cleanup
//! - **[`middleware`]** - Onion chain plus tracing, metrics, recovery and auth layers
//! - **[`dispatcher`]** - Request, response and handler types
//! - **[`app`]** - Shared router allowing registration while serving
//! - **[`config`]** - YAML and environment configuration
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`error`]** - Registration errors
//! - **[`ids`]** - Correlation ids and state tickets
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Server
//!     participant Router
//!     participant State as StateContainer
//!     participant Chain as Middleware Chain
//!     participant Handler
//!
//!     Server->>Router: dispatch(HandlerRequest)
//!     Router->>State: scope() (issue ticket)
//!     Router->>Router: match_route (first match wins)
//!     alt no match
//!         Router-->>Server: 404
//!     else match
//!         Router->>State: set("path", PathParams)
//!         Router->>Chain: then(handler)
//!         Chain->>Handler: call(req)
//!         Handler->>State: get / set
//!         Handler-->>Chain: HandlerResponse
//!         Chain-->>Router: HandlerResponse
//!     end
//!     Router->>State: destroy(ticket) on scope drop
//!     Router-->>Server: HandlerResponse
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use ionrouter::dispatcher::{HandlerRequest, HandlerResponse};
//! use ionrouter::middleware::{RecoveryMiddleware, TracingMiddleware};
//! use ionrouter::router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.use_middleware(RecoveryMiddleware);
//! router.use_middleware(TracingMiddleware);
//!
//! router.get(
//!     "/hello/:name/:number/world",
//!     |req: &mut HandlerRequest| {
//!         let name = req.path_param("name").unwrap_or_default();
//!         let number = req.path_param("number").unwrap_or_default();
//!         HandlerResponse::text(200, format!("{name} #{number}"))
//!     },
//!     Some("hello"),
//! )?;
//!
//! let res = router.handle(Method::GET, "/hello/ana/7/world");
//! assert_eq!(res.body_text(), Some("ana #7"));
//!
//! let path = router.reverse_route("hello", &["name", "bo", "number", "3"]);
//! assert_eq!(path, "/hello/bo/3/world");
//!
//! // the request's state is gone once dispatch returns
//! assert_eq!(router.state().live_count(), 0);
//! # Ok::<(), ionrouter::error::RouterError>(())
//! ```
//!
//! ## Configuration
//!
//! ```yaml
//! duplicate_names: reject
//! path_params_key: path
//! slow_match_threshold_us: 1000
//! state_ttl_secs: 300
//! ```
//!
//! Every field can be overridden with an `IONR_*` environment variable; see
//! [`config`]. Logging is configured separately through `IONR_LOG_*`; see
//! [`logging`].

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{default_app, App};
pub use config::{DuplicateNamePolicy, RouterConfig};
pub use dispatcher::{handler, BoxedHandler, Handler, HandlerRequest, HandlerResponse};
pub use error::RouterError;
pub use ids::{RequestId, Ticket};
pub use middleware::{sequence, Chain, Middleware};
pub use router::{PathParams, RouteMatch, Router};
pub use state::{RequestState, StateContainer, StateHandle};
