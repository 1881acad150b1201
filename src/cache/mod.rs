//! Thread-safe keyed storage for mirrored entities.

mod store;

pub use store::EntityStore;
