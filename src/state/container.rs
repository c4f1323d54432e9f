use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::bag::{StateHandle, StateValue};
use crate::dispatcher::{BoxedHandler, Handler, HandlerRequest, HandlerResponse};
use crate::ids::Ticket;

struct Entry {
    handle: StateHandle,
    created: Instant,
}

/// Table of scoped state bags, one per in-flight request.
///
/// Create and destroy go through a single mutex. The bags themselves carry
/// their own lock, so handlers never hold the table lock while they work.
pub struct StateContainer {
    entries: Mutex<HashMap<Ticket, Entry>>,
    next_ticket: AtomicU64,
}

impl Default for StateContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl StateContainer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Mint an identity for a new request. Issuing a ticket does not create
    /// an entry.
    pub fn issue_ticket(&self) -> Ticket {
        Ticket(self.next_ticket.fetch_add(1, Ordering::Relaxed))
    }

    /// Return the bag for `ticket`, creating an empty one if needed.
    pub fn get_or_create(&self, ticket: Ticket) -> StateHandle {
        let mut entries = self.entries.lock();
        let entry = entries.entry(ticket).or_insert_with(|| {
            debug!(ticket = %ticket, "Scoped state created");
            Entry {
                handle: StateHandle::new(),
                created: Instant::now(),
            }
        });
        entry.handle.clone()
    }

    /// Lookup without creating.
    #[must_use]
    pub fn get(&self, ticket: Ticket) -> Option<StateHandle> {
        self.entries.lock().get(&ticket).map(|e| e.handle.clone())
    }

    /// Remove the bag for `ticket`. Returns whether an entry existed.
    ///
    /// A later `get_or_create` for the same ticket starts from an empty bag.
    pub fn destroy(&self, ticket: Ticket) -> bool {
        let removed = self.entries.lock().remove(&ticket);
        match removed {
            Some(entry) => {
                debug!(
                    ticket = %ticket,
                    keys = entry.handle.len(),
                    age_us = entry.created.elapsed().as_micros() as u64,
                    "Scoped state destroyed"
                );
                true
            }
            None => false,
        }
    }

    /// Number of live entries. Zero whenever no request is in flight.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count() == 0
    }

    /// Forcibly destroy entries older than `max_age`.
    ///
    /// For requests that never return (stuck handlers, lost workers) the
    /// scope guard never drops; an external deadline calls this instead.
    pub fn sweep_older_than(&self, max_age: Duration) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.created.elapsed() < max_age);
        let swept = before - entries.len();
        drop(entries);

        if swept > 0 {
            warn!(
                swept = swept,
                max_age_ms = max_age.as_millis() as u64,
                "Swept expired scoped state entries"
            );
        }
        swept
    }

    /// Issue a ticket and return a guard that destroys its entry on drop.
    pub fn scope(self: &Arc<Self>) -> StateScope {
        let ticket = self.issue_ticket();
        StateScope {
            container: Arc::clone(self),
            ticket,
        }
    }

    /// Wrap `handler` so that the request's bag exists before it runs and is
    /// destroyed afterwards, even if it panics.
    ///
    /// A request whose state belongs to another container, or whose bag was
    /// already destroyed by an earlier lifecycle, is re-bound to a fresh
    /// ticket from this one.
    pub fn wrap_with_lifecycle(self: &Arc<Self>, handler: BoxedHandler) -> BoxedHandler {
        let container = Arc::clone(self);
        BoxedHandler::new(move |req: &mut HandlerRequest| -> HandlerResponse {
            if !req.state().belongs_to(&container) || req.state().is_stale() {
                req.set_state(RequestState::new(
                    Arc::clone(&container),
                    container.issue_ticket(),
                ));
            }
            let _guard = StateScope {
                container: Arc::clone(&container),
                ticket: req.state().ticket(),
            };
            req.state().handle();
            handler.call(req)
        })
    }
}

impl fmt::Debug for StateContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateContainer")
            .field("live", &self.live_count())
            .field("next_ticket", &self.next_ticket.load(Ordering::Relaxed))
            .finish()
    }
}

/// Guard owning one ticket's lifetime. Dropping it destroys the entry.
#[must_use = "dropping the scope immediately destroys the request state"]
pub struct StateScope {
    container: Arc<StateContainer>,
    ticket: Ticket,
}

impl StateScope {
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Lazy accessor for this scope's bag, to hand to a request.
    #[must_use]
    pub fn request_state(&self) -> RequestState {
        RequestState::new(Arc::clone(&self.container), self.ticket)
    }
}

impl Drop for StateScope {
    fn drop(&mut self) {
        self.container.destroy(self.ticket);
    }
}

/// Per-request view of the state container.
///
/// Nothing is allocated in the container until the first bag operation.
pub struct RequestState {
    container: OnceCell<Arc<StateContainer>>,
    ticket: Ticket,
    handle: OnceCell<StateHandle>,
}

// first ticket a fresh container issues
const DETACHED_TICKET: Ticket = Ticket(1);

impl RequestState {
    #[must_use]
    pub fn new(container: Arc<StateContainer>, ticket: Ticket) -> Self {
        Self {
            container: OnceCell::with_value(container),
            ticket,
            handle: OnceCell::new(),
        }
    }

    /// State backed by a private container, for requests built outside a router.
    ///
    /// The container is only allocated on first use.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            container: OnceCell::new(),
            ticket: DETACHED_TICKET,
            handle: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    #[must_use]
    pub fn container(&self) -> &Arc<StateContainer> {
        self.container.get_or_init(|| {
            let container = StateContainer::new();
            let ticket = container.issue_ticket();
            debug_assert_eq!(ticket, DETACHED_TICKET);
            Arc::new(container)
        })
    }

    #[must_use]
    pub fn belongs_to(&self, container: &Arc<StateContainer>) -> bool {
        self.container
            .get()
            .is_some_and(|own| Arc::ptr_eq(own, container))
    }

    /// Whether the bag cached here is no longer the container's entry for
    /// this ticket, i.e. it was destroyed or replaced since first use.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        match (self.handle.get(), self.container.get()) {
            (Some(cached), Some(container)) => container
                .get(self.ticket)
                .is_none_or(|live| !live.same_bag(cached)),
            _ => false,
        }
    }

    /// Whether the bag has been created for this request yet.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.handle.get().is_some()
    }

    /// The bag, created on first call.
    pub fn handle(&self) -> &StateHandle {
        self.handle
            .get_or_init(|| self.container().get_or_create(self.ticket))
    }

    pub fn set<T: std::any::Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.handle().set(key, value);
    }

    pub fn set_value(&self, key: impl Into<String>, value: StateValue) {
        self.handle().set_value(key, value);
    }

    #[must_use]
    pub fn get<T: std::any::Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.handle().get(key)
    }

    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<StateValue> {
        self.handle().get_value(key)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.handle().delete(key)
    }

    #[must_use]
    pub fn get_all(&self) -> HashMap<String, StateValue> {
        self.handle().get_all()
    }
}

impl fmt::Debug for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestState")
            .field("ticket", &self.ticket)
            .field("materialized", &self.is_materialized())
            .finish()
    }
}
