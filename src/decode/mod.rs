//! Decoding structured update records into entity mutations.
//!
//! One handler per recognized event type. A handler reads whatever fields
//! the payload declares, applies them to the entity store under the
//! record's per-entity lock, and hands the resulting change records to the
//! dispatch engine. Fields the payload omits are left untouched; malformed
//! fields are skipped with a warning, never aborting the rest of the
//! record.

mod channel;
mod member;
mod payload;
mod presence;
mod role;
mod server;
mod voice;

pub use channel::{ChannelCreateHandler, ChannelDeleteHandler, ChannelUpdateHandler};
pub use member::{MemberAddHandler, MemberRemoveHandler};
pub use presence::PresenceUpdateHandler;
pub use role::{RoleCreateHandler, RoleDeleteHandler, RoleUpdateHandler};
pub use server::{ServerCreateHandler, ServerDeleteHandler, ServerUpdateHandler};
pub use voice::VoiceStateUpdateHandler;

use crate::error::Result;
use crate::mirror::Mirror;
use serde_json::Value;

/// Decode-and-apply capability for one event type.
pub trait UpdateHandler: Send + Sync {
    /// The event-type tag this handler consumes.
    fn event_type(&self) -> &'static str;

    /// Apply the payload to the mirror and dispatch any change events.
    fn handle(&self, payload: &Value, mirror: &Mirror) -> Result<()>;
}

/// All built-in handlers, used by the mirror to populate its routing table.
pub(crate) fn builtin_handlers() -> Vec<Box<dyn UpdateHandler>> {
    vec![
        Box::new(PresenceUpdateHandler),
        Box::new(ChannelCreateHandler),
        Box::new(ChannelUpdateHandler),
        Box::new(ChannelDeleteHandler),
        Box::new(RoleCreateHandler),
        Box::new(RoleUpdateHandler),
        Box::new(RoleDeleteHandler),
        Box::new(MemberAddHandler),
        Box::new(MemberRemoveHandler),
        Box::new(ServerCreateHandler),
        Box::new(ServerUpdateHandler),
        Box::new(ServerDeleteHandler),
        Box::new(VoiceStateUpdateHandler),
    ]
}
