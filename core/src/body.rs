//! JSON request body encoding.
//!
//! # Design
//! POST and PUT differ only in how `null` members are treated: POST drops
//! them so the server applies its own defaults, PUT keeps them because the
//! request replaces the resource with exactly the fields sent. A missing
//! payload, or one that serializes to `null`, becomes an empty body rather
//! than the literal `null`.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// How `null` object members are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullHandling {
    /// Drop `null` members at every object nesting level.
    Omit,
    /// Write the value exactly as serialized.
    Include,
}

/// Encode `payload` as a JSON request body.
pub fn encode_body<P>(payload: Option<&P>, nulls: NullHandling) -> Result<String, ApiError>
where
    P: Serialize + ?Sized,
{
    let Some(payload) = payload else {
        return Ok(String::new());
    };

    let value = serde_json::to_value(payload).map_err(ApiError::Serialization)?;
    let value = match (value, nulls) {
        (Value::Null, _) => return Ok(String::new()),
        (value, NullHandling::Include) => value,
        (value, NullHandling::Omit) => strip_nulls(value),
    };

    serde_json::to_string(&value).map_err(ApiError::Serialization)
}

/// Remove `null` members from every object in `value`. Array elements that
/// are themselves `null` stay, since dropping them would shift indices.
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}
