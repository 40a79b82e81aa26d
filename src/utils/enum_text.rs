//! Conversion between unit enums and the TEXT columns they are stored in,
//! reusing their serde names.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

pub fn to_text<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        JsonValue::String(text) => Ok(text),
        other => Err(Error::Internal(format!("{} cannot be stored as text", other))),
    }
}

pub fn from_text<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_value(JsonValue::String(text.to_string()))?)
}
