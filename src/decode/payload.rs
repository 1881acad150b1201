//! Field extraction helpers for update payloads.
//!
//! The feed encodes 64-bit ids either as JSON numbers or as decimal
//! strings; these helpers accept both. All helpers return `None` for
//! missing or ill-shaped fields so callers can skip them per the
//! malformed-payload policy.

use crate::error::MirrorError;
use crate::types::EntityId;
use serde_json::Value;

/// Read an entity id field, accepting a number or a decimal string.
pub fn entity_id(value: &Value, field: &str) -> Option<EntityId> {
    let raw = value.get(field)?;
    parse_id(raw)
}

/// Parse an id value directly (for elements of id arrays).
pub fn parse_id(raw: &Value) -> Option<EntityId> {
    match raw {
        Value::Number(n) => n.as_u64().map(EntityId),
        Value::String(s) => s.parse().ok().map(EntityId),
        _ => None,
    }
}

pub fn string<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value.get(field)?.as_str()
}

pub fn u64_field(value: &Value, field: &str) -> Option<u64> {
    value.get(field)?.as_u64()
}

/// Read a positional index, rejecting values outside the i32 range rather
/// than truncating them.
pub fn i32_field(value: &Value, field: &str) -> Option<i32> {
    let raw = value.get(field)?.as_i64()?;
    i32::try_from(raw).ok()
}

pub fn bool_field(value: &Value, field: &str) -> Option<bool> {
    value.get(field)?.as_bool()
}

/// Read a field that distinguishes "absent" from "present but null":
/// `None` when the key is missing or ill-shaped, `Some(None)` when it is an
/// explicit null. A non-string, non-null value is malformed and must not be
/// mistaken for a null, which would clear the cached value.
pub fn nullable_string<'a>(value: &'a Value, field: &str) -> Option<Option<&'a str>> {
    match value.get(field)? {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s)),
        _ => None,
    }
}

/// A required field was missing or ill-shaped.
pub fn malformed(event_type: &str, detail: impl Into<String>) -> MirrorError {
    MirrorError::MalformedPayload {
        event_type: event_type.to_string(),
        detail: detail.into(),
    }
}
