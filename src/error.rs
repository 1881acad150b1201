//! Error types for the mirror.

use thiserror::Error;

/// Main error type for mirror operations.
///
/// Nothing here is fatal: malformed payloads are skipped field-by-field,
/// unknown event types and override kinds are dropped, and listener faults
/// are contained at the worker pool boundary. Errors exist so the decode
/// path can report what it skipped.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("malformed {event_type} payload: {detail}")]
    MalformedPayload {
        event_type: String,
        detail: String,
    },

    #[error("worker pool is shutting down")]
    ShuttingDown,
}

/// Result type for mirror operations.
pub type Result<T> = std::result::Result<T, MirrorError>;
