//! Handlers for role create/update/delete records.

use super::payload;
use super::UpdateHandler;
use crate::entities::Role;
use crate::error::Result;
use crate::events::{ChangeEvent, EntitySnapshot};
use crate::mirror::Mirror;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// Creates a role record and attaches it to its server.
pub struct RoleCreateHandler;

impl UpdateHandler for RoleCreateHandler {
    fn event_type(&self) -> &'static str {
        "ROLE_CREATE"
    }

    fn handle(&self, record: &Value, mirror: &Mirror) -> Result<()> {
        let id = payload::entity_id(record, "id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing role id"))?;
        let server_id = payload::entity_id(record, "server_id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing server id"))?;

        let role = mirror.roles().get_or_create(id, || {
            let name = payload::string(record, "name").unwrap_or_default();
            let position = payload::i32_field(record, "position").unwrap_or(0);
            Role::new(id, server_id, name, position)
        });
        if let Some(hoist) = payload::bool_field(record, "hoist") {
            role.replace_hoist(hoist);
        }

        let server = mirror
            .servers()
            .get_or_create(server_id, || crate::entities::Server::new(server_id, ""));
        server.add_role(id);

        Ok(())
    }
}

/// Applies field-diffed role updates.
pub struct RoleUpdateHandler;

impl UpdateHandler for RoleUpdateHandler {
    fn event_type(&self) -> &'static str {
        "ROLE_UPDATE"
    }

    fn handle(&self, record: &Value, mirror: &Mirror) -> Result<()> {
        let id = payload::entity_id(record, "id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing role id"))?;

        let Some(role) = mirror.roles().get(id) else {
            return RoleCreateHandler.handle(record, mirror);
        };

        let mut events = Vec::new();

        if let Some(name) = payload::string(record, "name") {
            if let Some(old) = role.replace_name(name) {
                events.push(ChangeEvent::Renamed {
                    entity: EntitySnapshot::Role(Arc::clone(&role)),
                    old,
                    new: name.to_string(),
                });
            }
        }

        if let Some(position) = payload::i32_field(record, "position") {
            if let Some(old) = role.replace_position(position) {
                events.push(ChangeEvent::Moved {
                    entity: EntitySnapshot::Role(Arc::clone(&role)),
                    old,
                    new: position,
                });
            }
        }

        if let Some(hoist) = payload::bool_field(record, "hoist") {
            if let Some(old) = role.replace_hoist(hoist) {
                events.push(ChangeEvent::HoistChanged {
                    role: Arc::clone(&role),
                    old,
                    new: hoist,
                });
            }
        }

        mirror.dispatch_all(events);
        Ok(())
    }
}

/// Removes a role record. Deleting an absent id is a no-op.
pub struct RoleDeleteHandler;

impl UpdateHandler for RoleDeleteHandler {
    fn event_type(&self) -> &'static str {
        "ROLE_DELETE"
    }

    fn handle(&self, record: &Value, mirror: &Mirror) -> Result<()> {
        let id = payload::entity_id(record, "id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing role id"))?;

        let Some(role) = mirror.roles().remove(id) else {
            trace!(%id, "delete for uncached role, ignoring");
            return Ok(());
        };

        if let Some(server) = mirror.servers().get(role.server()) {
            server.remove_role(id);
        }

        mirror.dispatch(ChangeEvent::Deleted {
            entity: EntitySnapshot::Role(role),
        });
        Ok(())
    }
}
