//! The mirror facade tying stores, registry, and dispatch together.

use crate::cache::EntityStore;
use crate::decode::{builtin_handlers, UpdateHandler};
use crate::dispatch::{DispatchEngine, WorkerPool};
use crate::entities::{Channel, Role, Server, User};
use crate::events::{ChangeEvent, EventKind};
use crate::listeners::{ListenerHandle, ListenerRegistry};
use crate::types::{default_avatar_index, EntityId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Mirror configuration.
#[derive(Clone, Debug)]
pub struct MirrorConfig {
    /// Number of listener-dispatch worker threads.
    pub worker_threads: usize,

    /// Modulus for the stock-avatar derivation rule. The remote platform
    /// currently ships 5 variants.
    pub default_avatar_variants: u16,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            default_avatar_variants: 5,
        }
    }
}

/// A local mirror of the remote platform's object graph.
///
/// The transport layer feeds structured update records into `on_update`;
/// application code registers listeners for the change kinds it cares
/// about and reads current state through the lookup API. Mutation happens
/// only through the decode path.
pub struct Mirror {
    config: MirrorConfig,
    users: EntityStore<User>,
    channels: EntityStore<Channel>,
    roles: EntityStore<Role>,
    servers: EntityStore<Server>,
    registry: Arc<ListenerRegistry>,
    engine: DispatchEngine,
    pool: Arc<WorkerPool>,
    handlers: HashMap<&'static str, Box<dyn UpdateHandler>>,
}

impl Mirror {
    pub fn new(config: MirrorConfig) -> Self {
        let registry = Arc::new(ListenerRegistry::new());
        let pool = Arc::new(WorkerPool::new(config.worker_threads));
        let engine = DispatchEngine::new(Arc::clone(&registry), Arc::clone(&pool));

        let mut handlers: HashMap<&'static str, Box<dyn UpdateHandler>> = HashMap::new();
        for handler in builtin_handlers() {
            handlers.insert(handler.event_type(), handler);
        }

        Self {
            config,
            users: EntityStore::new(),
            channels: EntityStore::new(),
            roles: EntityStore::new(),
            servers: EntityStore::new(),
            registry,
            engine,
            pool,
            handlers,
        }
    }

    // --- Inbound feed ---

    /// Apply one structured update record from the feed.
    ///
    /// Unrecognized event types are ignored without error. A malformed
    /// payload is logged and skipped; it never aborts ingestion.
    pub fn on_update(&self, event_type: &str, payload: &Value) {
        let Some(handler) = self.handlers.get(event_type) else {
            trace!(event_type, "ignoring unrecognized event type");
            return;
        };

        if let Err(e) = handler.handle(payload, self) {
            warn!(event_type, error = %e, "skipping unprocessable update record");
        } else {
            debug!(event_type, "applied update record");
        }
    }

    // --- Listener API ---

    /// Register a callback for one event kind. Registration order is the
    /// dispatch order; the same callback may be registered more than once.
    pub fn register<F>(&self, kind: EventKind, callback: F) -> ListenerHandle
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.registry.register(kind, callback)
    }

    /// Remove a registration. In-flight notifications already snapshotted
    /// may still reach the callback.
    pub fn unregister(&self, handle: &ListenerHandle) {
        self.registry.unregister(handle);
    }

    // --- Lookup API (read-only for consumers) ---

    pub fn user(&self, id: EntityId) -> Option<Arc<User>> {
        self.users.get(id)
    }

    pub fn channel(&self, id: EntityId) -> Option<Arc<Channel>> {
        self.channels.get(id)
    }

    pub fn role(&self, id: EntityId) -> Option<Arc<Role>> {
        self.roles.get(id)
    }

    pub fn server(&self, id: EntityId) -> Option<Arc<Server>> {
        self.servers.get(id)
    }

    pub fn users(&self) -> &EntityStore<User> {
        &self.users
    }

    pub fn channels(&self) -> &EntityStore<Channel> {
        &self.channels
    }

    pub fn roles(&self) -> &EntityStore<Role> {
        &self.roles
    }

    pub fn servers(&self) -> &EntityStore<Server> {
        &self.servers
    }

    /// Stock avatar variant for a discriminator, under the configured
    /// derivation rule.
    pub fn default_avatar_index(&self, discriminator: u16) -> u16 {
        default_avatar_index(discriminator, self.config.default_avatar_variants)
    }

    /// Break voice-connection relations pointing at a deleted channel.
    pub(crate) fn disconnect_voice_users(&self, channel: EntityId) {
        for user in self.users.snapshot() {
            if user.connected_voice_channel() == Some(channel) {
                user.set_connected_voice_channel(None);
            }
        }
    }

    // --- Dispatch plumbing (decode path only) ---

    pub(crate) fn dispatch(&self, event: ChangeEvent) {
        self.engine.dispatch(event);
    }

    pub(crate) fn dispatch_all<I>(&self, events: I)
    where
        I: IntoIterator<Item = ChangeEvent>,
    {
        self.engine.dispatch_all(events);
    }

    // --- Lifecycle ---

    /// Block until every notification accepted so far has been delivered.
    pub fn flush(&self) {
        self.pool.flush();
    }

    /// Stop accepting notifications, deliver what was accepted, and join
    /// the worker threads. Running callbacks are never interrupted.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

impl Default for Mirror {
    fn default() -> Self {
        Self::new(MirrorConfig::default())
    }
}
