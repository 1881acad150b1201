//! The entity store: one thread-safe map per entity kind.

use crate::types::EntityId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A thread-safe mapping from id to entity.
///
/// This is the single source of truth for current state of one entity kind.
/// At most one instance exists per id at any time: concurrent callers racing
/// `get_or_create` for an unseen id all observe the same winning record.
///
/// Records are created on first observed reference and removed only by an
/// explicit deletion event; removal is visible to all subsequent lookups as
/// soon as `remove` returns.
///
/// The store does not serialize field mutations. Entities carry their own
/// per-record lock, and the decode path is the single writer per incoming
/// update record.
pub struct EntityStore<T> {
    entries: RwLock<HashMap<EntityId, Arc<T>>>,
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the record for `id`, constructing and inserting one via
    /// `factory` if absent. Exactly one construction wins under concurrency;
    /// `factory` runs under the write lock and must not call back into this
    /// store.
    pub fn get_or_create<F>(&self, id: EntityId, factory: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        if let Some(existing) = self.entries.read().get(&id) {
            return Arc::clone(existing);
        }

        let mut entries = self.entries.write();
        // Re-check: another writer may have won between the locks.
        match entries.entry(id) {
            std::collections::hash_map::Entry::Occupied(e) => Arc::clone(e.get()),
            std::collections::hash_map::Entry::Vacant(v) => {
                let entity = Arc::new(factory());
                v.insert(Arc::clone(&entity));
                entity
            }
        }
    }

    /// Non-blocking snapshot read.
    pub fn get(&self, id: EntityId) -> Option<Arc<T>> {
        self.entries.read().get(&id).cloned()
    }

    /// Atomically detach and return the record if present. A later
    /// `get_or_create` for the same id constructs a fresh record.
    pub fn remove(&self, id: EntityId) -> Option<Arc<T>> {
        self.entries.write().remove(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// All cached ids at a point in time.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entries.read().keys().copied().collect()
    }

    /// Point-in-time copy of all cached records.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries.read().values().cloned().collect()
    }
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_get_or_create_returns_existing() {
        let store = EntityStore::new();
        let first = store.get_or_create(EntityId(1), || "alpha".to_string());
        let second = store.get_or_create(EntityId(1), || "beta".to_string());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, "alpha");
    }

    #[test]
    fn test_remove_makes_fresh_record() {
        let store = EntityStore::new();
        let first = store.get_or_create(EntityId(1), || "alpha".to_string());
        let removed = store.remove(EntityId(1)).unwrap();
        assert!(Arc::ptr_eq(&first, &removed));
        assert!(store.get(EntityId(1)).is_none());

        let fresh = store.get_or_create(EntityId(1), || "beta".to_string());
        assert!(!Arc::ptr_eq(&first, &fresh));
        assert_eq!(*fresh, "beta");
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let store: EntityStore<String> = EntityStore::new();
        assert!(store.remove(EntityId(404)).is_none());
    }

    #[test]
    fn test_concurrent_get_or_create_single_winner() {
        let store = Arc::new(EntityStore::new());
        let constructions = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let constructions = Arc::clone(&constructions);
                thread::spawn(move || {
                    store.get_or_create(EntityId(7), || {
                        constructions.fetch_add(1, Ordering::SeqCst);
                        "entity".to_string()
                    })
                })
            })
            .collect();

        let records: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
        for record in &records[1..] {
            assert!(Arc::ptr_eq(&records[0], record));
        }
    }

    #[test]
    fn test_snapshot_and_ids() {
        let store = EntityStore::new();
        store.get_or_create(EntityId(1), || 10u32);
        store.get_or_create(EntityId(2), || 20u32);

        let mut ids = store.ids();
        ids.sort();
        assert_eq!(ids, vec![EntityId(1), EntityId(2)]);
        assert_eq!(store.snapshot().len(), 2);
    }
}
