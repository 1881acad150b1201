//! Server entities: the attachment point for members, channels, and roles.

use crate::types::EntityId;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Default)]
struct ServerFields {
    name: String,
    members: HashSet<EntityId>,
    channels: HashSet<EntityId>,
    roles: HashSet<EntityId>,
}

/// A mirrored server. Members, channels, and roles are id relations;
/// the records themselves live in their own stores.
pub struct Server {
    id: EntityId,
    fields: RwLock<ServerFields>,
}

impl Server {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            fields: RwLock::new(ServerFields {
                name: name.into(),
                ..Default::default()
            }),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> String {
        self.fields.read().name.clone()
    }

    pub fn members(&self) -> HashSet<EntityId> {
        self.fields.read().members.clone()
    }

    pub fn has_member(&self, user: EntityId) -> bool {
        self.fields.read().members.contains(&user)
    }

    pub fn channels(&self) -> HashSet<EntityId> {
        self.fields.read().channels.clone()
    }

    pub fn roles(&self) -> HashSet<EntityId> {
        self.fields.read().roles.clone()
    }

    /// Attach a user. Idempotent; returns true if newly added.
    pub fn add_member(&self, user: EntityId) -> bool {
        self.fields.write().members.insert(user)
    }

    /// Detach a user; returns true if the user was a member.
    pub fn remove_member(&self, user: EntityId) -> bool {
        self.fields.write().members.remove(&user)
    }

    pub fn add_channel(&self, channel: EntityId) -> bool {
        self.fields.write().channels.insert(channel)
    }

    pub fn remove_channel(&self, channel: EntityId) -> bool {
        self.fields.write().channels.remove(&channel)
    }

    pub fn add_role(&self, role: EntityId) -> bool {
        self.fields.write().roles.insert(role)
    }

    pub fn remove_role(&self, role: EntityId) -> bool {
        self.fields.write().roles.remove(&role)
    }

    /// Apply a new name; returns the old name only if it differed.
    pub fn replace_name(&self, name: &str) -> Option<String> {
        let mut fields = self.fields.write();
        if fields.name == name {
            return None;
        }
        Some(std::mem::replace(&mut fields.name, name.to_string()))
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}
