//! Handlers for server membership records.

use super::payload;
use super::UpdateHandler;
use crate::entities::{Server, User};
use crate::error::Result;
use crate::events::ChangeEvent;
use crate::mirror::Mirror;
use serde_json::Value;

/// Attaches a user to a server's member set.
pub struct MemberAddHandler;

impl UpdateHandler for MemberAddHandler {
    fn event_type(&self) -> &'static str {
        "MEMBER_ADD"
    }

    fn handle(&self, record: &Value, mirror: &Mirror) -> Result<()> {
        let server_id = payload::entity_id(record, "server_id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing server id"))?;
        let user_payload = record
            .get("user")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing user object"))?;
        let user_id = payload::entity_id(user_payload, "id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing user id"))?;

        mirror.users().get_or_create(user_id, || {
            let name = payload::string(user_payload, "username").unwrap_or_default();
            let discriminator = payload::string(user_payload, "discriminator")
                .and_then(|d| d.parse().ok())
                .unwrap_or(0);
            let bot = payload::bool_field(user_payload, "bot").unwrap_or(false);
            User::new(user_id, name, discriminator, bot)
        });

        let server = mirror
            .servers()
            .get_or_create(server_id, || Server::new(server_id, ""));

        if server.add_member(user_id) {
            mirror.dispatch(ChangeEvent::MembershipChanged {
                server,
                user: user_id,
                joined: true,
            });
        }
        Ok(())
    }
}

/// Detaches a user from a server's member set and from the server's roles.
pub struct MemberRemoveHandler;

impl UpdateHandler for MemberRemoveHandler {
    fn event_type(&self) -> &'static str {
        "MEMBER_REMOVE"
    }

    fn handle(&self, record: &Value, mirror: &Mirror) -> Result<()> {
        let server_id = payload::entity_id(record, "server_id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing server id"))?;
        let user_id = record
            .get("user")
            .and_then(|u| payload::entity_id(u, "id"))
            .or_else(|| payload::entity_id(record, "user_id"))
            .ok_or_else(|| payload::malformed(self.event_type(), "missing user id"))?;

        // Removal for an unknown server is a no-op, not create-on-demand.
        let Some(server) = mirror.servers().get(server_id) else {
            return Ok(());
        };

        if server.remove_member(user_id) {
            for role in mirror.roles().snapshot() {
                if role.server() == server_id {
                    role.remove_member(user_id);
                }
            }
            mirror.dispatch(ChangeEvent::MembershipChanged {
                server,
                user: user_id,
                joined: false,
            });
        }
        Ok(())
    }
}
