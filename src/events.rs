//! Listener kinds and the change events dispatched to them.

use crate::entities::{Channel, Role, Server, User};
use crate::types::{EntityId, OverwriteTarget, Permissions, UserStatus};
use std::fmt;
use std::sync::Arc;

/// The category of observable change a listener subscribes to.
///
/// Open tag: new kinds may be added without touching the registry or the
/// dispatch path, which are keyed by this type generically.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An entity's display name changed.
    Renamed,
    /// An entity's positional index changed.
    Moved,
    /// A user's presence status changed.
    StatusChanged,
    /// A user's avatar changed.
    AvatarChanged,
    /// A user's activity changed.
    ActivityChanged,
    /// A role's hoist flag changed.
    HoistChanged,
    /// A channel's nsfw flag changed.
    NsfwChanged,
    /// A channel's permission override map changed.
    OverwritesChanged,
    /// A user joined or left a server.
    MembershipChanged,
    /// An entity was removed from the mirror.
    Deleted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Shared snapshot of the entity a change event concerns.
#[derive(Clone)]
pub enum EntitySnapshot {
    User(Arc<User>),
    Channel(Arc<Channel>),
    Role(Arc<Role>),
    Server(Arc<Server>),
}

impl EntitySnapshot {
    pub fn id(&self) -> EntityId {
        match self {
            EntitySnapshot::User(u) => u.id(),
            EntitySnapshot::Channel(c) => c.id(),
            EntitySnapshot::Role(r) => r.id(),
            EntitySnapshot::Server(s) => s.id(),
        }
    }
}

impl fmt::Debug for EntitySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntitySnapshot::User(u) => write!(f, "User({})", u.id()),
            EntitySnapshot::Channel(c) => write!(f, "Channel({})", c.id()),
            EntitySnapshot::Role(r) => write!(f, "Role({})", r.id()),
            EntitySnapshot::Server(s) => write!(f, "Server({})", s.id()),
        }
    }
}

/// A transient (old, new) change notification.
///
/// Constructed by the decode path after a mutation is applied, dispatched to
/// the listeners registered for its kind, then discarded. Never stored.
#[derive(Clone, Debug)]
pub enum ChangeEvent {
    Renamed {
        entity: EntitySnapshot,
        old: String,
        new: String,
    },
    Moved {
        entity: EntitySnapshot,
        old: i32,
        new: i32,
    },
    StatusChanged {
        user: Arc<User>,
        old: UserStatus,
        new: UserStatus,
    },
    AvatarChanged {
        user: Arc<User>,
        old: Option<String>,
        new: Option<String>,
    },
    ActivityChanged {
        user: Arc<User>,
        old: Option<String>,
        new: Option<String>,
    },
    HoistChanged {
        role: Arc<Role>,
        old: bool,
        new: bool,
    },
    NsfwChanged {
        channel: Arc<Channel>,
        old: bool,
        new: bool,
    },
    OverwritesChanged {
        channel: Arc<Channel>,
        target: OverwriteTarget,
        old: Option<Permissions>,
        new: Option<Permissions>,
    },
    MembershipChanged {
        server: Arc<Server>,
        user: EntityId,
        joined: bool,
    },
    Deleted {
        entity: EntitySnapshot,
    },
}

impl ChangeEvent {
    /// The listener kind interested in this event.
    pub fn kind(&self) -> EventKind {
        match self {
            ChangeEvent::Renamed { .. } => EventKind::Renamed,
            ChangeEvent::Moved { .. } => EventKind::Moved,
            ChangeEvent::StatusChanged { .. } => EventKind::StatusChanged,
            ChangeEvent::AvatarChanged { .. } => EventKind::AvatarChanged,
            ChangeEvent::ActivityChanged { .. } => EventKind::ActivityChanged,
            ChangeEvent::HoistChanged { .. } => EventKind::HoistChanged,
            ChangeEvent::NsfwChanged { .. } => EventKind::NsfwChanged,
            ChangeEvent::OverwritesChanged { .. } => EventKind::OverwritesChanged,
            ChangeEvent::MembershipChanged { .. } => EventKind::MembershipChanged,
            ChangeEvent::Deleted { .. } => EventKind::Deleted,
        }
    }

    /// The id of the entity this event concerns. Used to key per-entity
    /// delivery ordering in the worker pool.
    pub fn entity_id(&self) -> EntityId {
        match self {
            ChangeEvent::Renamed { entity, .. } | ChangeEvent::Deleted { entity } => entity.id(),
            ChangeEvent::Moved { entity, .. } => entity.id(),
            ChangeEvent::StatusChanged { user, .. }
            | ChangeEvent::AvatarChanged { user, .. }
            | ChangeEvent::ActivityChanged { user, .. } => user.id(),
            ChangeEvent::HoistChanged { role, .. } => role.id(),
            ChangeEvent::NsfwChanged { channel, .. }
            | ChangeEvent::OverwritesChanged { channel, .. } => channel.id(),
            ChangeEvent::MembershipChanged { server, .. } => server.id(),
        }
    }
}
