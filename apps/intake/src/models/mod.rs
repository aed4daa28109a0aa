//! Typed records exchanged with the REST backend.
//!
//! The backend serializes ids inconsistently (numbers on some endpoints,
//! numeric strings on others), so the deserializers here accept both.

pub mod auth;
pub mod candidate;
pub mod location;
pub mod module;
pub mod timesheet;

use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("id {n} is not an integer"))),
        Value::String(s) => s.trim().parse().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected an id, got {other}"))),
    }
}

pub(crate) fn de_opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("id {n} is not an integer"))),
        Value::String(s) => s.trim().parse().map(Some).map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected an id, got {other}"))),
    }
}

pub(crate) fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}
