//! Encoding and decoding between typed records and wire rows.
//!
//! Rows cross the table-store port as snake_case JSON objects; records use
//! camelCase serde names. Every read passes through [`decode`] and every
//! write through [`encode`], so key-case translation happens in exactly one
//! place.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use keycase::{keys_to_camel, keys_to_snake};

use super::ports::{StoreError, WireRow};

/// Decode a wire row into a typed record.
pub(crate) fn decode<T: DeserializeOwned>(row: WireRow) -> Result<T, StoreError> {
    serde_json::from_value(keys_to_camel(Value::Object(row)))
        .map_err(|err| StoreError::decode(err.to_string()))
}

/// Encode a typed draft or patch as a wire row.
pub(crate) fn encode<T: Serialize>(record: &T) -> Result<WireRow, StoreError> {
    let value =
        serde_json::to_value(record).map_err(|err| StoreError::decode(err.to_string()))?;
    match keys_to_snake(value) {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::decode(format!(
            "expected an object payload, got {other}"
        ))),
    }
}
