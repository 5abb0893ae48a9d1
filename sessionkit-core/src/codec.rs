//! Wire codec for stored values.
//!
//! The data endpoints only accept a constrained character set for values, so every value is
//! serialized to compact JSON and shipped as the hex form of its UTF-8 bytes behind a `0x`
//! marker. Each byte is rendered as exactly two lowercase hex digits, which keeps ASCII text
//! identical to a per-character encoding while still round-tripping multi-byte text.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::{SessionError, SessionResult};

/// Marker prefixed to every hex-encoded payload.
pub const WIRE_MARKER: &str = "0x";

/// Encodes a JSON-serializable value into its wire form.
///
/// # Errors
/// Returns `SessionError::Serialization` if the value cannot be represented as JSON.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> SessionResult<String> {
    let json = serde_json::to_string(value)?;
    Ok(format!("{WIRE_MARKER}{}", hex::encode(json.as_bytes())))
}

/// Decodes a wire value back into a JSON value.
///
/// # Errors
/// Returns `SessionError::MalformedEncoding` if the marker is missing, the payload is empty,
/// has an odd length, contains non-hex characters, or does not decode to valid UTF-8 JSON.
pub fn decode(wire: &str) -> SessionResult<Value> {
    decode_as(wire)
}

/// Decodes a wire value straight into a typed value.
///
/// # Errors
/// See [`decode`]. A JSON document that does not match `T` is also `MalformedEncoding`.
pub fn decode_as<T: DeserializeOwned>(wire: &str) -> SessionResult<T> {
    let payload = wire
        .strip_prefix(WIRE_MARKER)
        .ok_or_else(|| malformed("missing 0x marker"))?;

    if payload.is_empty() {
        return Err(malformed("empty payload"));
    }
    if payload.len() % 2 != 0 {
        return Err(malformed(format!(
            "odd payload length {}",
            payload.len()
        )));
    }

    let bytes = hex::decode(payload).map_err(|e| malformed(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| malformed(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| malformed(format!("invalid json: {e}")))
}

fn malformed(reason: impl Into<String>) -> SessionError {
    SessionError::MalformedEncoding {
        reason: reason.into(),
    }
}
