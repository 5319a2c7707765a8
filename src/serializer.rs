//! Pluggable body serializers.
//!
//! Serializers work on [`serde_json::Value`] as the intermediate model so they
//! can be stored as trait objects and swapped at configuration time. Typed
//! conversion happens in [`serialize`] and [`deserialize`].

use crate::error::BoxError;
use crate::{Error, RequestContent, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Encodes request bodies and decodes response bodies.
pub trait Serializer: Send + Sync {
    /// Media type used for `Content-Type` and `Accept`.
    fn content_type(&self) -> &str;

    /// Encodes a value into body bytes.
    fn to_bytes(&self, value: &serde_json::Value) -> std::result::Result<Vec<u8>, BoxError>;

    /// Decodes body bytes into a value.
    fn from_bytes(&self, bytes: &[u8]) -> std::result::Result<serde_json::Value, BoxError>;
}

/// JSON serializer backed by `serde_json`. This is the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Compact JSON output.
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Indented JSON output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Serializer for JsonSerializer {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn to_bytes(&self, value: &serde_json::Value) -> std::result::Result<Vec<u8>, BoxError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        Ok(bytes)
    }

    fn from_bytes(&self, bytes: &[u8]) -> std::result::Result<serde_json::Value, BoxError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Serializes a typed value into request content.
///
/// # Errors
///
/// Returns [`Error::SerializationFailed`] if the value cannot be encoded.
pub fn serialize<T>(serializer: &dyn Serializer, value: &T) -> Result<RequestContent>
where
    T: Serialize + ?Sized,
{
    let value =
        serde_json::to_value(value).map_err(|e| Error::SerializationFailed(e.to_string()))?;
    let body = serializer
        .to_bytes(&value)
        .map_err(|e| Error::SerializationFailed(e.to_string()))?;

    Ok(RequestContent::new(body, serializer.content_type()))
}

/// Deserializes body bytes into a typed value.
///
/// The error is the serializer's message; callers attach status and body.
pub fn deserialize<T>(serializer: &dyn Serializer, bytes: &[u8]) -> std::result::Result<T, BoxError>
where
    T: DeserializeOwned,
{
    let value = serializer.from_bytes(bytes)?;
    Ok(serde_json::from_value(value)?)
}
