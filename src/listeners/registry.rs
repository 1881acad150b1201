//! Registry of change-event callbacks, keyed by event kind.

use crate::events::{ChangeEvent, EventKind};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A registered callback. Shared so a snapshot can outlive removal.
pub type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Unique identifier for a registration.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

/// Opaque handle returned by `register`; pass it back to `unregister`.
#[derive(Clone, Copy, Debug)]
pub struct ListenerHandle {
    pub id: ListenerId,
    pub kind: EventKind,
}

struct Registration {
    id: ListenerId,
    callback: Listener,
}

/// Thread-safe, read-mostly registry of listeners per event kind.
///
/// Registration order is preserved and is the dispatch order within one
/// notification. The same callback may be registered multiple times for the
/// same kind; each registration gets its own handle.
pub struct ListenerRegistry {
    listeners: RwLock<HashMap<EventKind, Vec<Registration>>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append a callback for `kind`.
    pub fn register<F>(&self, kind: EventKind, callback: F) -> ListenerHandle
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let registration = Registration {
            id,
            callback: Arc::new(callback),
        };
        self.listeners
            .write()
            .entry(kind)
            .or_default()
            .push(registration);
        ListenerHandle { id, kind }
    }

    /// Remove a registration by handle identity. Removing an already-removed
    /// handle is a no-op. An in-flight snapshot is unaffected.
    pub fn unregister(&self, handle: &ListenerHandle) {
        let mut listeners = self.listeners.write();
        if let Some(registrations) = listeners.get_mut(&handle.kind) {
            registrations.retain(|r| r.id != handle.id);
            if registrations.is_empty() {
                listeners.remove(&handle.kind);
            }
        }
    }

    /// Point-in-time copy of the callbacks for `kind`, in registration
    /// order. Safe to iterate without the registry lock; concurrent
    /// register/unregister calls do not affect the returned snapshot.
    pub fn snapshot(&self, kind: EventKind) -> Vec<Listener> {
        self.listeners
            .read()
            .get(&kind)
            .map(|regs| regs.iter().map(|r| Arc::clone(&r.callback)).collect())
            .unwrap_or_default()
    }

    /// Number of registrations for `kind`.
    pub fn count(&self, kind: EventKind) -> usize {
        self.listeners.read().get(&kind).map_or(0, Vec::len)
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
