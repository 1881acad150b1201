//! Handlers for channel create/update/delete records.

use super::payload;
use super::UpdateHandler;
use crate::entities::Channel;
use crate::error::Result;
use crate::events::{ChangeEvent, EntitySnapshot};
use crate::mirror::Mirror;
use crate::types::{EntityId, OverwriteTarget, Permissions};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Parse a permission-overwrite array into its two partitions.
///
/// Each element declares its partition with a `type` string; entries with
/// an unknown type (or no usable id) are dropped silently, per policy.
fn parse_overwrites(
    record: &Value,
) -> Option<(
    HashMap<EntityId, Permissions>,
    HashMap<EntityId, Permissions>,
)> {
    let array = record.get("permission_overwrites")?.as_array()?;
    let mut roles = HashMap::new();
    let mut users = HashMap::new();

    for entry in array {
        let Some(id) = payload::entity_id(entry, "id") else {
            trace!("skipping overwrite entry without id");
            continue;
        };
        let allow = payload::u64_field(entry, "allow").unwrap_or(0);
        let deny = payload::u64_field(entry, "deny").unwrap_or(0);
        let perms = Permissions::new(allow, deny);
        match payload::string(entry, "type") {
            Some("role") => {
                roles.insert(id, perms);
            }
            Some("member") => {
                users.insert(id, perms);
            }
            other => {
                trace!(?other, %id, "dropping overwrite with unknown type");
            }
        }
    }

    Some((roles, users))
}

/// Diff the cached override maps against the payload's and apply both
/// insertions/updates and removals, producing one event per changed entry.
fn sync_overwrites(channel: &Arc<Channel>, record: &Value, events: &mut Vec<ChangeEvent>) {
    let Some((desired_roles, desired_users)) = parse_overwrites(record) else {
        return;
    };

    let partitions = [
        (
            channel.role_overwrites(),
            desired_roles,
            OverwriteTarget::Role as fn(EntityId) -> OverwriteTarget,
        ),
        (
            channel.user_overwrites(),
            desired_users,
            OverwriteTarget::User as fn(EntityId) -> OverwriteTarget,
        ),
    ];

    for (current, desired, make_target) in partitions {
        for (&id, &perms) in &desired {
            let target = make_target(id);
            if let Some(old) = channel.replace_overwrite(target, perms) {
                events.push(ChangeEvent::OverwritesChanged {
                    channel: Arc::clone(channel),
                    target,
                    old,
                    new: Some(perms),
                });
            }
        }
        for &id in current.keys() {
            if !desired.contains_key(&id) {
                let target = make_target(id);
                if let Some(old) = channel.remove_overwrite(target) {
                    events.push(ChangeEvent::OverwritesChanged {
                        channel: Arc::clone(channel),
                        target,
                        old: Some(old),
                        new: None,
                    });
                }
            }
        }
    }
}

/// Creates a channel record and attaches it to its server.
pub struct ChannelCreateHandler;

impl UpdateHandler for ChannelCreateHandler {
    fn event_type(&self) -> &'static str {
        "CHANNEL_CREATE"
    }

    fn handle(&self, record: &Value, mirror: &Mirror) -> Result<()> {
        let id = payload::entity_id(record, "id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing channel id"))?;
        let server_id = payload::entity_id(record, "server_id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing server id"))?;

        let channel = mirror.channels().get_or_create(id, || {
            let name = payload::string(record, "name").unwrap_or_default();
            let position = payload::i32_field(record, "position").unwrap_or(0);
            Channel::new(id, server_id, name, position)
        });

        if let Some(nsfw) = payload::bool_field(record, "nsfw") {
            channel.replace_nsfw(nsfw);
        }

        // Creation carries no prior state, so overwrites apply silently.
        if let Some((roles, users)) = parse_overwrites(record) {
            for (id, perms) in roles {
                channel.replace_overwrite(OverwriteTarget::Role(id), perms);
            }
            for (id, perms) in users {
                channel.replace_overwrite(OverwriteTarget::User(id), perms);
            }
        }

        let server = mirror
            .servers()
            .get_or_create(server_id, || crate::entities::Server::new(server_id, ""));
        server.add_channel(id);

        Ok(())
    }
}

/// Applies field-diffed channel updates.
pub struct ChannelUpdateHandler;

impl UpdateHandler for ChannelUpdateHandler {
    fn event_type(&self) -> &'static str {
        "CHANNEL_UPDATE"
    }

    fn handle(&self, record: &Value, mirror: &Mirror) -> Result<()> {
        let id = payload::entity_id(record, "id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing channel id"))?;

        // Updates for an unknown channel create it on demand.
        let Some(channel) = mirror.channels().get(id) else {
            return ChannelCreateHandler.handle(record, mirror);
        };

        let mut events = Vec::new();

        if let Some(name) = payload::string(record, "name") {
            if let Some(old) = channel.replace_name(name) {
                events.push(ChangeEvent::Renamed {
                    entity: EntitySnapshot::Channel(Arc::clone(&channel)),
                    old,
                    new: name.to_string(),
                });
            }
        }

        if let Some(position) = payload::i32_field(record, "position") {
            if let Some(old) = channel.replace_position(position) {
                events.push(ChangeEvent::Moved {
                    entity: EntitySnapshot::Channel(Arc::clone(&channel)),
                    old,
                    new: position,
                });
            }
        }

        if let Some(nsfw) = payload::bool_field(record, "nsfw") {
            if let Some(old) = channel.replace_nsfw(nsfw) {
                events.push(ChangeEvent::NsfwChanged {
                    channel: Arc::clone(&channel),
                    old,
                    new: nsfw,
                });
            }
        }

        sync_overwrites(&channel, record, &mut events);

        mirror.dispatch_all(events);
        Ok(())
    }
}

/// Removes a channel record. Deleting an absent id is a no-op.
pub struct ChannelDeleteHandler;

impl UpdateHandler for ChannelDeleteHandler {
    fn event_type(&self) -> &'static str {
        "CHANNEL_DELETE"
    }

    fn handle(&self, record: &Value, mirror: &Mirror) -> Result<()> {
        let id = payload::entity_id(record, "id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing channel id"))?;

        let Some(channel) = mirror.channels().remove(id) else {
            trace!(%id, "delete for uncached channel, ignoring");
            return Ok(());
        };

        if let Some(server) = mirror.servers().get(channel.server()) {
            server.remove_channel(id);
        }
        mirror.disconnect_voice_users(id);

        mirror.dispatch(ChangeEvent::Deleted {
            entity: EntitySnapshot::Channel(channel),
        });
        Ok(())
    }
}
