//! Listener registration and snapshot iteration.

mod registry;

pub use registry::{Listener, ListenerHandle, ListenerId, ListenerRegistry};
