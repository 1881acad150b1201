//! User entities.

use crate::types::{default_avatar_index, EntityId, UserStatus};
use parking_lot::RwLock;
use std::fmt;

/// Mutable field block, guarded by the per-entity lock.
#[derive(Debug, Default)]
struct UserFields {
    name: String,
    discriminator: u16,
    avatar: Option<String>,
    status: UserStatus,
    activity: Option<String>,
    connected_voice_channel: Option<EntityId>,
}

/// A mirrored user.
pub struct User {
    id: EntityId,
    bot: bool,
    fields: RwLock<UserFields>,
}

impl User {
    pub fn new(id: EntityId, name: impl Into<String>, discriminator: u16, bot: bool) -> Self {
        Self {
            id,
            bot,
            fields: RwLock::new(UserFields {
                name: name.into(),
                discriminator,
                ..Default::default()
            }),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn is_bot(&self) -> bool {
        self.bot
    }

    pub fn name(&self) -> String {
        self.fields.read().name.clone()
    }

    pub fn discriminator(&self) -> u16 {
        self.fields.read().discriminator
    }

    pub fn avatar(&self) -> Option<String> {
        self.fields.read().avatar.clone()
    }

    pub fn status(&self) -> UserStatus {
        self.fields.read().status
    }

    pub fn activity(&self) -> Option<String> {
        self.fields.read().activity.clone()
    }

    /// The voice channel the user is connected to, as an id relation.
    pub fn connected_voice_channel(&self) -> Option<EntityId> {
        self.fields.read().connected_voice_channel
    }

    pub fn has_default_avatar(&self) -> bool {
        self.fields.read().avatar.is_none()
    }

    /// Stock avatar variant for users without a custom avatar.
    pub fn default_avatar_index(&self, variants: u16) -> u16 {
        default_avatar_index(self.fields.read().discriminator, variants)
    }

    /// Apply a new name; returns the old name only if it differed.
    pub fn replace_name(&self, name: &str) -> Option<String> {
        let mut fields = self.fields.write();
        if fields.name == name {
            return None;
        }
        Some(std::mem::replace(&mut fields.name, name.to_string()))
    }

    /// Apply a new avatar hash; returns the old hash only if it differed.
    pub fn replace_avatar(&self, avatar: Option<&str>) -> Option<Option<String>> {
        let mut fields = self.fields.write();
        if fields.avatar.as_deref() == avatar {
            return None;
        }
        Some(std::mem::replace(
            &mut fields.avatar,
            avatar.map(str::to_string),
        ))
    }

    /// Apply a new status; returns the old status only if it differed.
    pub fn replace_status(&self, status: UserStatus) -> Option<UserStatus> {
        let mut fields = self.fields.write();
        if fields.status == status {
            return None;
        }
        Some(std::mem::replace(&mut fields.status, status))
    }

    /// Apply a new activity; returns the old activity only if it differed.
    pub fn replace_activity(&self, activity: Option<&str>) -> Option<Option<String>> {
        let mut fields = self.fields.write();
        if fields.activity.as_deref() == activity {
            return None;
        }
        Some(std::mem::replace(
            &mut fields.activity,
            activity.map(str::to_string),
        ))
    }

    pub fn set_discriminator(&self, discriminator: u16) {
        self.fields.write().discriminator = discriminator;
    }

    pub fn set_connected_voice_channel(&self, channel: Option<EntityId>) {
        self.fields.write().connected_voice_channel = channel;
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("bot", &self.bot)
            .finish()
    }
}
