//! # Request-Scoped State
//!
//! Every in-flight request gets its own key/value bag that middleware and
//! handlers share without global variables.
//!
//! ## Lifecycle
//!
//! 1. The router mints a [`Ticket`](crate::ids::Ticket) and a [`StateScope`]
//!    guard for the request.
//! 2. The bag is created lazily: only the first bag operation (normally the
//!    router writing path bindings after a successful match) inserts an entry.
//! 3. When dispatch returns, or unwinds from a panic, the guard drops and the
//!    entry is destroyed.
//!
//! With no requests in flight, [`StateContainer::live_count`] is zero.
//!
//! ## Example
//!
//! ```rust
//! use ionrouter::state::StateContainer;
//! use std::sync::Arc;
//!
//! let container = Arc::new(StateContainer::new());
//! {
//!     let scope = container.scope();
//!     let state = scope.request_state();
//!     state.set("user", "alice".to_string());
//!     assert_eq!(container.live_count(), 1);
//! }
//! assert_eq!(container.live_count(), 0);
//! ```

mod bag;
mod container;

pub use bag::{StateHandle, StateValue};
pub use container::{RequestState, StateContainer, StateScope};
