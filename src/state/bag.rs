use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Value stored in a scoped state bag.
pub type StateValue = Arc<dyn Any + Send + Sync>;

/// Handle to one request's key/value bag.
///
/// Cloning the handle shares the bag. Every operation takes the bag's own
/// lock, so [`get_all`](StateHandle::get_all) always returns a snapshot of
/// committed writes.
#[derive(Clone, Default)]
pub struct StateHandle {
    inner: Arc<RwLock<HashMap<String, StateValue>>>,
}

impl StateHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a typed value, replacing any previous value under `key`.
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.set_value(key, Arc::new(value));
    }

    /// Store an already shared value.
    pub fn set_value(&self, key: impl Into<String>, value: StateValue) {
        self.inner.write().insert(key.into(), value);
    }

    /// Typed lookup. `None` when the key is absent or holds another type.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get_value(key)
            .and_then(|value| value.downcast::<T>().ok())
    }

    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<StateValue> {
        self.inner.read().get(key).map(Arc::clone)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    /// Remove `key`; returns whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.inner.write().remove(key).is_some()
    }

    /// Snapshot of the whole bag.
    #[must_use]
    pub fn get_all(&self) -> HashMap<String, StateValue> {
        self.inner
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Whether two handles point at the same bag.
    #[must_use]
    pub fn same_bag(&self, other: &StateHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = self.keys();
        keys.sort();
        f.debug_struct("StateHandle").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_typed() {
        let bag = StateHandle::new();
        bag.set("user", "alice".to_string());
        bag.set("count", 3_u32);

        assert_eq!(bag.get::<String>("user").as_deref().map(String::as_str), Some("alice"));
        assert_eq!(bag.get::<u32>("count").map(|v| *v), Some(3));
        // wrong type is a miss, not a panic
        assert!(bag.get::<u64>("count").is_none());
        assert!(bag.get::<u32>("missing").is_none());
    }

    #[test]
    fn test_delete_and_snapshot() {
        let bag = StateHandle::new();
        bag.set("k1", true);
        bag.set("k2", true);
        bag.set("k3", true);
        assert!(bag.delete("k2"));
        assert!(!bag.delete("k2"));

        let snapshot = bag.get_all();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_key("k1"));
        assert!(!snapshot.contains_key("k2"));

        // later writes do not leak into an earlier snapshot
        bag.set("k4", true);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(bag.len(), 3);
    }

    #[test]
    fn test_clone_shares_bag() {
        let a = StateHandle::new();
        let b = a.clone();
        b.set("shared", 1_i32);
        assert!(a.contains("shared"));
        assert!(a.same_bag(&b));
        assert!(!a.same_bag(&StateHandle::new()));
    }
}
