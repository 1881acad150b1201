//! # Gateway Mirror
//!
//! A thread-safe local mirror of a remote collaborative platform's object
//! graph (users, servers, channels, roles) with typed change listeners.
//!
//! ## Core Concepts
//!
//! - **Entities**: Shared mutable records keyed by opaque 64-bit id
//! - **Entity stores**: One thread-safe map per entity kind, the source of
//!   truth for current state
//! - **Update decoding**: Incoming records are diffed against cached state;
//!   only genuine changes produce events
//! - **Dispatch**: Change events fan out to registered listeners on a
//!   worker pool, off the ingestion path, with per-entity ordering and
//!   per-callback fault isolation
//!
//! ## Example
//!
//! ```ignore
//! use gateway_mirror::{EventKind, Mirror, MirrorConfig};
//! use serde_json::json;
//!
//! let mirror = Mirror::new(MirrorConfig::default());
//!
//! mirror.register(EventKind::Renamed, |event| {
//!     println!("renamed: {:?}", event);
//! });
//!
//! // Driven by the transport layer:
//! mirror.on_update("PRESENCE_UPDATE", &json!({
//!     "user": {"id": 42, "username": "Beta"},
//!     "status": "online",
//! }));
//! ```

pub mod cache;
pub mod decode;
pub mod dispatch;
pub mod entities;
pub mod error;
pub mod events;
pub mod listeners;
pub mod mirror;
pub mod types;

// Re-exports
pub use cache::EntityStore;
pub use decode::UpdateHandler;
pub use dispatch::{DispatchEngine, WorkerPool};
pub use entities::{Channel, Role, Server, User};
pub use error::{MirrorError, Result};
pub use events::{ChangeEvent, EntitySnapshot, EventKind};
pub use listeners::{Listener, ListenerHandle, ListenerId, ListenerRegistry};
pub use mirror::{Mirror, MirrorConfig};
pub use types::*;
