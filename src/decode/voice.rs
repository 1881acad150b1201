//! Handler for voice state records.

use super::payload;
use super::UpdateHandler;
use crate::entities::User;
use crate::error::Result;
use crate::mirror::Mirror;
use serde_json::Value;

/// Tracks which voice channel a user is connected to.
///
/// The connection is an id relation on the user, applied unconditionally
/// like membership attachment: joining, moving, and leaving (explicit null
/// channel id) all reduce to setting the relation. No change event is
/// dispatched; consumers observe the relation through the lookup API.
pub struct VoiceStateUpdateHandler;

impl UpdateHandler for VoiceStateUpdateHandler {
    fn event_type(&self) -> &'static str {
        "VOICE_STATE_UPDATE"
    }

    fn handle(&self, record: &Value, mirror: &Mirror) -> Result<()> {
        let user_id = payload::entity_id(record, "user_id")
            .ok_or_else(|| payload::malformed(self.event_type(), "missing user id"))?;

        let channel = match record.get("channel_id") {
            Some(Value::Null) => None,
            Some(raw) => Some(
                payload::parse_id(raw)
                    .ok_or_else(|| payload::malformed(self.event_type(), "bad channel id"))?,
            ),
            None => return Err(payload::malformed(self.event_type(), "missing channel id")),
        };

        let user = mirror
            .users()
            .get_or_create(user_id, || User::new(user_id, "", 0, false));
        user.set_connected_voice_channel(channel);
        Ok(())
    }
}
