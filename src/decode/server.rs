//! Handlers for server create/update/delete records.

use super::payload;
use super::UpdateHandler;
use crate::entities::Server;
use crate::error::Result;
use crate::events::{ChangeEvent, EntitySnapshot};
use crate::mirror::Mirror;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// Creates a server record.
pub struct ServerCreateHandler;

impl UpdateHandler for ServerCreateHandler {
    fn event_type(&self) -> &'static str {
        "SERVER_CREATE"
    }

    fn handle(&self, record: &Value, mirror: &Mirror) -> Result<()> {
        let id = payload::entity_id(record, "id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing server id"))?;

        let server = mirror.servers().get_or_create(id, || {
            let name = payload::string(record, "name").unwrap_or_default();
            Server::new(id, name)
        });

        // A create for an already-cached placeholder fills in the name.
        if let Some(name) = payload::string(record, "name") {
            server.replace_name(name);
        }
        Ok(())
    }
}

/// Applies field-diffed server updates.
pub struct ServerUpdateHandler;

impl UpdateHandler for ServerUpdateHandler {
    fn event_type(&self) -> &'static str {
        "SERVER_UPDATE"
    }

    fn handle(&self, record: &Value, mirror: &Mirror) -> Result<()> {
        let id = payload::entity_id(record, "id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing server id"))?;

        let Some(server) = mirror.servers().get(id) else {
            return ServerCreateHandler.handle(record, mirror);
        };

        if let Some(name) = payload::string(record, "name") {
            if let Some(old) = server.replace_name(name) {
                mirror.dispatch(ChangeEvent::Renamed {
                    entity: EntitySnapshot::Server(Arc::clone(&server)),
                    old,
                    new: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Removes a server and every channel and role attached to it.
///
/// Relations are ids, so breaking them is removal from the stores; the
/// cascaded records get their own `Deleted` events.
pub struct ServerDeleteHandler;

impl UpdateHandler for ServerDeleteHandler {
    fn event_type(&self) -> &'static str {
        "SERVER_DELETE"
    }

    fn handle(&self, record: &Value, mirror: &Mirror) -> Result<()> {
        let id = payload::entity_id(record, "id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing server id"))?;

        let Some(server) = mirror.servers().remove(id) else {
            trace!(%id, "delete for uncached server, ignoring");
            return Ok(());
        };

        for channel_id in server.channels() {
            if let Some(channel) = mirror.channels().remove(channel_id) {
                mirror.disconnect_voice_users(channel_id);
                mirror.dispatch(ChangeEvent::Deleted {
                    entity: EntitySnapshot::Channel(channel),
                });
            }
        }
        for role_id in server.roles() {
            if let Some(role) = mirror.roles().remove(role_id) {
                mirror.dispatch(ChangeEvent::Deleted {
                    entity: EntitySnapshot::Role(role),
                });
            }
        }

        mirror.dispatch(ChangeEvent::Deleted {
            entity: EntitySnapshot::Server(server),
        });
        Ok(())
    }
}
