//! # Dispatcher Types
//!
//! The vocabulary every other module speaks:
//!
//! - [`HandlerRequest`]: method, path, query, headers, body and the request's
//!   scoped state.
//! - [`HandlerResponse`]: status, headers and a JSON (or text) body.
//! - [`Handler`]: one-method trait, implemented by any
//!   `Fn(&mut HandlerRequest) -> HandlerResponse` closure.
//!
//! ```rust
//! use ionrouter::dispatcher::{handler, HandlerRequest, HandlerResponse};
//!
//! let hello = handler(|req: &mut HandlerRequest| {
//!     let name = req.path_param("name").unwrap_or_else(|| "world".to_string());
//!     HandlerResponse::text(200, format!("Hello, {name}!"))
//! });
//! ```

mod core;

pub use core::{
    handler, parse_query_params, BoxedHandler, Handler, HandlerRequest, HandlerResponse,
    HeaderVec, DEFAULT_PATH_PARAMS_KEY, MAX_INLINE_HEADERS,
};
