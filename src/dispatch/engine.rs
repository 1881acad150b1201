//! Decides what to notify and hands the invocation to the worker pool.

use crate::events::ChangeEvent;
use crate::listeners::ListenerRegistry;
use crate::dispatch::WorkerPool;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Maps applied mutations to listener notifications.
///
/// The decode path calls `dispatch` once per change record it produced; the
/// engine keys the notification task by entity id so the pool delivers
/// events for one entity in the order their mutations were applied. The
/// registry snapshot is taken inside the task, when the invocation actually
/// runs, so registration churn never touches the decode path.
pub struct DispatchEngine {
    registry: Arc<ListenerRegistry>,
    pool: Arc<WorkerPool>,
}

impl DispatchEngine {
    pub fn new(registry: Arc<ListenerRegistry>, pool: Arc<WorkerPool>) -> Self {
        Self { registry, pool }
    }

    /// Submit a notification task for one change event.
    ///
    /// Each registered callback runs in registration order; a panicking
    /// callback is logged with its kind and entity id and does not prevent
    /// the remaining callbacks from running.
    pub fn dispatch(&self, event: ChangeEvent) {
        let kind = event.kind();
        let entity_id = event.entity_id();
        let registry = Arc::clone(&self.registry);

        let submitted = self.pool.submit(entity_id.0, move || {
            for listener in registry.snapshot(kind) {
                if catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
                    warn!(%kind, %entity_id, "uncaught panic in listener");
                }
            }
        });

        if submitted.is_err() {
            debug!(%kind, %entity_id, "mirror shutting down, notification dropped");
        }
    }

    /// Dispatch a batch of change records produced by one incoming update.
    pub fn dispatch_all<I>(&self, events: I)
    where
        I: IntoIterator<Item = ChangeEvent>,
    {
        for event in events {
            self.dispatch(event);
        }
    }
}
