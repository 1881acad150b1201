//! The mirrored object graph.
//!
//! Entities are shared (`Arc`) records with an immutable id and a mutable
//! field block behind a per-entity lock. Cross-references between entities
//! are id-based relations resolved through the entity stores, never owning
//! pointers, so deletion is just removal from the store.
//!
//! Setters come in two flavors: plain `set_*` for fields applied
//! unconditionally, and `replace_*` which compares by value and returns the
//! prior value only when it actually changed. The decode path uses
//! `replace_*` so re-delivered updates produce no spurious change events.

mod channel;
mod role;
mod server;
mod user;

pub use channel::Channel;
pub use role::Role;
pub use server::Server;
pub use user::User;
