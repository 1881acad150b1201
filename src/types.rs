//! Core identifier and value types for the mirror.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a mirrored entity (user, channel, role, server).
///
/// Ids are opaque 64-bit values assigned by the remote platform; the mirror
/// never derives meaning from them beyond equality and hashing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(raw: u64) -> Self {
        EntityId(raw)
    }
}

/// A pair of explicitly-granted and explicitly-denied capability bitmasks.
///
/// A capability bit absent from both masks is "inherited" (neither granted
/// nor denied by this override).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub allowed: u64,
    pub denied: u64,
}

impl Permissions {
    /// An override that grants and denies nothing.
    pub const EMPTY: Permissions = Permissions {
        allowed: 0,
        denied: 0,
    };

    pub fn new(allowed: u64, denied: u64) -> Self {
        Self { allowed, denied }
    }

    /// Whether the given capability bit is explicitly granted.
    pub fn allows(&self, bit: u64) -> bool {
        self.allowed & bit != 0
    }

    /// Whether the given capability bit is explicitly denied.
    pub fn denies(&self, bit: u64) -> bool {
        self.denied & bit != 0
    }
}

/// Which partition a permission override belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverwriteTarget {
    Role(EntityId),
    User(EntityId),
}

impl OverwriteTarget {
    pub fn id(&self) -> EntityId {
        match *self {
            OverwriteTarget::Role(id) | OverwriteTarget::User(id) => id,
        }
    }
}

/// Presence status of a user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Online,
    Idle,
    DoNotDisturb,
    #[default]
    Offline,
}

impl UserStatus {
    /// Parse a status string from the feed. Unknown strings map to
    /// `Offline`, matching the remote platform's own fallback.
    pub fn from_feed(s: &str) -> Self {
        match s {
            "online" => UserStatus::Online,
            "idle" => UserStatus::Idle,
            "dnd" | "do_not_disturb" => UserStatus::DoNotDisturb,
            _ => UserStatus::Offline,
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserStatus::Online => "online",
            UserStatus::Idle => "idle",
            UserStatus::DoNotDisturb => "dnd",
            UserStatus::Offline => "offline",
        };
        write!(f, "{}", s)
    }
}

/// Derive the default avatar variant for a user without a custom avatar.
///
/// The remote platform currently assigns one of `variants` stock avatars by
/// taking the discriminator modulo the variant count. The modulus is
/// configurable because it is protocol trivia, not a design invariant.
pub fn default_avatar_index(discriminator: u16, variants: u16) -> u16 {
    discriminator % variants.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(UserStatus::from_feed("online"), UserStatus::Online);
        assert_eq!(UserStatus::from_feed("idle"), UserStatus::Idle);
        assert_eq!(UserStatus::from_feed("dnd"), UserStatus::DoNotDisturb);
        assert_eq!(UserStatus::from_feed("offline"), UserStatus::Offline);
        assert_eq!(UserStatus::from_feed("invisible?"), UserStatus::Offline);
    }

    #[test]
    fn test_permission_bits() {
        let perms = Permissions::new(0b1010, 0b0100);
        assert!(perms.allows(0b0010));
        assert!(!perms.allows(0b0001));
        assert!(perms.denies(0b0100));
        assert!(!perms.denies(0b1000));
        assert_eq!(Permissions::EMPTY, Permissions::default());
    }

    #[test]
    fn test_default_avatar_index() {
        assert_eq!(default_avatar_index(1234, 5), 4);
        assert_eq!(default_avatar_index(5, 5), 0);
        assert_eq!(default_avatar_index(7, 3), 1);
    }
}
