//! Role entities.

use crate::types::EntityId;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Default)]
struct RoleFields {
    name: String,
    position: i32,
    /// Whether members holding this role are listed separately.
    hoist: bool,
    members: HashSet<EntityId>,
}

/// A mirrored role. The owning server is an id back-reference.
pub struct Role {
    id: EntityId,
    server: EntityId,
    fields: RwLock<RoleFields>,
}

impl Role {
    pub fn new(id: EntityId, server: EntityId, name: impl Into<String>, position: i32) -> Self {
        Self {
            id,
            server,
            fields: RwLock::new(RoleFields {
                name: name.into(),
                position,
                ..Default::default()
            }),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn server(&self) -> EntityId {
        self.server
    }

    pub fn name(&self) -> String {
        self.fields.read().name.clone()
    }

    pub fn position(&self) -> i32 {
        self.fields.read().position
    }

    pub fn is_hoisted(&self) -> bool {
        self.fields.read().hoist
    }

    pub fn members(&self) -> HashSet<EntityId> {
        self.fields.read().members.clone()
    }

    pub fn has_member(&self, user: EntityId) -> bool {
        self.fields.read().members.contains(&user)
    }

    /// Attach a user to this role. Idempotent; returns true if the user was
    /// not already a member.
    pub fn add_member(&self, user: EntityId) -> bool {
        self.fields.write().members.insert(user)
    }

    /// Detach a user; returns true if the user was a member.
    pub fn remove_member(&self, user: EntityId) -> bool {
        self.fields.write().members.remove(&user)
    }

    /// Apply a new name; returns the old name only if it differed.
    pub fn replace_name(&self, name: &str) -> Option<String> {
        let mut fields = self.fields.write();
        if fields.name == name {
            return None;
        }
        Some(std::mem::replace(&mut fields.name, name.to_string()))
    }

    /// Apply a new position; returns the old position only if it differed.
    pub fn replace_position(&self, position: i32) -> Option<i32> {
        let mut fields = self.fields.write();
        if fields.position == position {
            return None;
        }
        Some(std::mem::replace(&mut fields.position, position))
    }

    /// Apply a new hoist flag; returns the old flag only if it differed.
    pub fn replace_hoist(&self, hoist: bool) -> Option<bool> {
        let mut fields = self.fields.write();
        if fields.hoist == hoist {
            return None;
        }
        Some(std::mem::replace(&mut fields.hoist, hoist))
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Role")
            .field("id", &self.id)
            .field("server", &self.server)
            .field("name", &self.name())
            .finish()
    }
}
