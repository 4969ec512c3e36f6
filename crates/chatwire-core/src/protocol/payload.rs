//! Chat payload (JSON text frame).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ChatWireError, Result};

/// One chat payload as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePayload {
    /// Message text.
    pub message: String,
    /// Any other fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WirePayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extra: Map::new(),
        }
    }

    /// Attach a pass-through field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// String value of a pass-through field, if present.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// Encode any serializable payload into a text frame.
///
/// The encoded value must be a JSON object whose `message` is a string.
pub fn encode_outbound<T: Serialize + ?Sized>(payload: &T) -> Result<String> {
    let value = serde_json::to_value(payload)
        .map_err(|e| ChatWireError::Serialization(format!("json encode failed: {e}")))?;

    let obj = value
        .as_object()
        .ok_or_else(|| ChatWireError::Serialization("payload must be a json object".into()))?;
    match obj.get("message") {
        Some(Value::String(_)) => {}
        Some(_) => {
            return Err(ChatWireError::Serialization(
                "payload field `message` must be a string".into(),
            ))
        }
        None => {
            return Err(ChatWireError::Serialization(
                "payload requires a `message` field".into(),
            ))
        }
    }

    serde_json::to_string(&value)
        .map_err(|e| ChatWireError::Serialization(format!("json encode failed: {e}")))
}

/// Decode an inbound text frame.
///
/// Text that is not JSON, or is a bare JSON scalar, is taken as the message
/// itself. Objects and arrays must have the `{ "message": "...", ... }` shape,
/// anything else is a `BadFrame`.
pub fn decode_inbound(text: &str) -> Result<WirePayload> {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return Ok(WirePayload::new(text)),
    };

    match value {
        Value::String(s) => Ok(WirePayload::new(s)),
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(WirePayload::new(text.trim())),
        other => serde_json::from_value(other)
            .map_err(|e| ChatWireError::BadFrame(format!("invalid payload: {e}"))),
    }
}
