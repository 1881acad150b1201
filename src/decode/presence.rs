//! Handler for presence update records.

use super::payload;
use super::UpdateHandler;
use crate::entities::User;
use crate::error::Result;
use crate::events::{ChangeEvent, EntitySnapshot};
use crate::mirror::Mirror;
use crate::types::UserStatus;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

const EVENT_TYPE: &str = "PRESENCE_UPDATE";

/// Applies presence records: status, name, avatar, and activity changes
/// plus server/role membership attachment.
///
/// Membership attachment happens on every delivery regardless of whether it
/// changes anything; the attachment is idempotent and cheap. Field updates
/// compare against the cached value first, so a re-delivered record
/// produces no change events.
pub struct PresenceUpdateHandler;

impl UpdateHandler for PresenceUpdateHandler {
    fn event_type(&self) -> &'static str {
        EVENT_TYPE
    }

    fn handle(&self, record: &Value, mirror: &Mirror) -> Result<()> {
        let user_payload = record
            .get("user")
            .ok_or_else(|| payload::malformed(EVENT_TYPE, "missing user object"))?;
        let id = payload::entity_id(user_payload, "id")
            .ok_or_else(|| payload::malformed(EVENT_TYPE, "missing user id"))?;

        let user = mirror.users().get_or_create(id, || {
            let name = payload::string(user_payload, "username").unwrap_or_default();
            let discriminator = payload::string(user_payload, "discriminator")
                .and_then(|d| d.parse().ok())
                .unwrap_or(0);
            let bot = payload::bool_field(user_payload, "bot").unwrap_or(false);
            User::new(id, name, discriminator, bot)
        });

        // Relationship side effects, applied unconditionally.
        if let Some(server_id) = payload::entity_id(record, "server_id") {
            let server = mirror
                .servers()
                .get_or_create(server_id, || crate::entities::Server::new(server_id, ""));
            server.add_member(id);

            if let Some(roles) = record.get("roles").and_then(Value::as_array) {
                for raw in roles {
                    let Some(role_id) = payload::parse_id(raw) else {
                        trace!(%id, "skipping unparseable role id in presence record");
                        continue;
                    };
                    if let Some(role) = mirror.roles().get(role_id) {
                        role.add_member(id);
                    }
                }
            }
        }

        // Discriminators change without a dedicated listener kind.
        if let Some(discriminator) = payload::string(user_payload, "discriminator")
            .and_then(|d| d.parse().ok())
        {
            if user.discriminator() != discriminator {
                user.set_discriminator(discriminator);
            }
        }

        let mut events = Vec::new();

        if let Some(status) = payload::string(record, "status") {
            let new = UserStatus::from_feed(status);
            if let Some(old) = user.replace_status(new) {
                events.push(ChangeEvent::StatusChanged {
                    user: Arc::clone(&user),
                    old,
                    new,
                });
            }
        }

        if let Some(name) = payload::string(user_payload, "username") {
            if let Some(old) = user.replace_name(name) {
                events.push(ChangeEvent::Renamed {
                    entity: EntitySnapshot::User(Arc::clone(&user)),
                    old,
                    new: name.to_string(),
                });
            }
        }

        if let Some(avatar) = payload::nullable_string(user_payload, "avatar") {
            if let Some(old) = user.replace_avatar(avatar) {
                events.push(ChangeEvent::AvatarChanged {
                    user: Arc::clone(&user),
                    old,
                    new: avatar.map(str::to_string),
                });
            }
        }

        if let Some(activity) = record.get("activity") {
            let name = activity.get("name").and_then(Value::as_str);
            if let Some(old) = user.replace_activity(name) {
                events.push(ChangeEvent::ActivityChanged {
                    user: Arc::clone(&user),
                    old,
                    new: name.map(str::to_string),
                });
            }
        }

        mirror.dispatch_all(events);
        Ok(())
    }
}
