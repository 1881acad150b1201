//! Channel-like entities with overridable permissions.

use crate::types::{EntityId, OverwriteTarget, Permissions};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Default)]
struct ChannelFields {
    name: String,
    position: i32,
    nsfw: bool,
    /// Overrides keyed by role id.
    role_overwrites: HashMap<EntityId, Permissions>,
    /// Overrides keyed by user id.
    user_overwrites: HashMap<EntityId, Permissions>,
}

/// A mirrored channel (category-like).
///
/// The owning server is an id back-reference, resolved through the server
/// store when needed.
pub struct Channel {
    id: EntityId,
    server: EntityId,
    fields: RwLock<ChannelFields>,
}

impl Channel {
    pub fn new(id: EntityId, server: EntityId, name: impl Into<String>, position: i32) -> Self {
        Self {
            id,
            server,
            fields: RwLock::new(ChannelFields {
                name: name.into(),
                position,
                ..Default::default()
            }),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Id of the server this channel belongs to.
    pub fn server(&self) -> EntityId {
        self.server
    }

    pub fn name(&self) -> String {
        self.fields.read().name.clone()
    }

    pub fn position(&self) -> i32 {
        self.fields.read().position
    }

    pub fn is_nsfw(&self) -> bool {
        self.fields.read().nsfw
    }

    /// Override for the given role, `EMPTY` if none is set.
    pub fn role_overwrite(&self, role: EntityId) -> Permissions {
        self.fields
            .read()
            .role_overwrites
            .get(&role)
            .copied()
            .unwrap_or(Permissions::EMPTY)
    }

    /// Override for the given user, `EMPTY` if none is set.
    pub fn user_overwrite(&self, user: EntityId) -> Permissions {
        self.fields
            .read()
            .user_overwrites
            .get(&user)
            .copied()
            .unwrap_or(Permissions::EMPTY)
    }

    /// Point-in-time copy of the role override map.
    pub fn role_overwrites(&self) -> HashMap<EntityId, Permissions> {
        self.fields.read().role_overwrites.clone()
    }

    /// Point-in-time copy of the user override map.
    pub fn user_overwrites(&self) -> HashMap<EntityId, Permissions> {
        self.fields.read().user_overwrites.clone()
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

    /// Apply a new nsfw flag; returns the old flag only if it differed.
    pub fn replace_nsfw(&self, nsfw: bool) -> Option<bool> {
        let mut fields = self.fields.write();
        if fields.nsfw == nsfw {
            return None;
        }
        Some(std::mem::replace(&mut fields.nsfw, nsfw))
    }

    /// Apply an override for `target`; returns the old override only if the
    /// value changed (absent and `EMPTY` are distinct states, so inserting
    /// an `EMPTY` override over nothing is still a change).
    pub fn replace_overwrite(
        &self,
        target: OverwriteTarget,
        perms: Permissions,
    ) -> Option<Option<Permissions>> {
        let mut fields = self.fields.write();
        let map = match target {
            OverwriteTarget::Role(_) => &mut fields.role_overwrites,
            OverwriteTarget::User(_) => &mut fields.user_overwrites,
        };
        let old = map.insert(target.id(), perms);
        if old == Some(perms) {
            return None;
        }
        Some(old)
    }

    /// Remove the override for `target`; returns the old override if one
    /// existed.
    pub fn remove_overwrite(&self, target: OverwriteTarget) -> Option<Permissions> {
        let mut fields = self.fields.write();
        let map = match target {
            OverwriteTarget::Role(_) => &mut fields.role_overwrites,
            OverwriteTarget::User(_) => &mut fields.user_overwrites,
        };
        map.remove(&target.id())
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("server", &self.server)
            .field("name", &self.name())
            .finish()
    }
}
