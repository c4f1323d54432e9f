//! # Router Module
//!
//! Method + path routing with `:name` variables and named-route reversal.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Parsing route patterns once, at registration
//! - Matching requests in registration order (first match wins)
//! - Extracting path variables into the request's scoped state
//! - Building concrete paths back from route names
//!
//! ## Pattern Syntax
//!
//! Patterns are `/`-separated. A segment starting with `:` is a variable and
//! binds exactly one non-empty request segment; every other segment must
//! match literally. One trailing slash is ignored on both patterns and
//! requests, so `/users/:id` matches `/users/7` and `/users/7/` alike.
//!
//! | Pattern | Path | Result |
//! |---------|------|--------|
//! | `/hello/:name` | `/hello/ana` | `name = "ana"` |
//! | `/hello/:name` | `/hello/` | no match |
//! | `/hello/:name` | `/hello/ana/x` | no match |
//! | `/` | `/` | match, no bindings |
//!
//! ## Dispatch
//!
//! [`Router::dispatch`] opens a state scope for the request, matches it,
//! stores the bindings as [`PathParams`] under the configured key, runs the
//! middleware chain around the matched handler and finally destroys the
//! request's state.

mod core;
mod pattern;
#[cfg(test)]
mod tests;

pub use core::{Route, RouteHandle, RouteMatch, Router, ROUTABLE_METHODS};
pub use pattern::{
    PathParams, PathPattern, ParamVec, Segment, MAX_INLINE_PARAMS, PARAM_SIGIL,
};
