//! Structured-value codec used for attributes and command payloads.

use serde_json::Value;

use crate::error::CodecError;
use crate::payload::Payload;

/// Converts structured values to and from their single-line text form.
///
/// Implementations must never emit a newline: one value occupies the
/// remainder of exactly one log record.
pub trait ValueCodec {
    /// Serialize a value to single-line text.
    fn serialize(&self, value: &Value) -> Result<String, CodecError>;

    /// Parse text produced by [`serialize`](ValueCodec::serialize).
    fn deserialize(&self, text: &str) -> Result<Value, CodecError>;

    /// Parse and freeze a command payload.
    fn deserialize_frozen(&self, text: &str) -> Result<Payload, CodecError> {
        self.deserialize(text).map(Payload::freeze)
    }
}

/// Compact JSON codec backed by `serde_json`.
///
/// # Examples
///
/// ```
/// use cairn_core::{JsonCodec, ValueCodec};
/// use serde_json::json;
///
/// let codec = JsonCodec;
/// let text = codec.serialize(&json!({"type": "move", "x": 1})).unwrap();
/// assert_eq!(text, r#"{"type":"move","x":1}"#);
/// assert_eq!(codec.deserialize(&text).unwrap(), json!({"type": "move", "x": 1}));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl ValueCodec for JsonCodec {
    fn serialize(&self, value: &Value) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }

    fn deserialize(&self, text: &str) -> Result<Value, CodecError> {
        Ok(serde_json::from_str(text.trim())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compact_output_has_no_newlines() {
        let value = json!({"nested": {"list": [1, 2, {"s": "a\nb"}]}});
        let text = JsonCodec.serialize(&value).unwrap();
        assert!(!text.contains('\n'));
        assert_eq!(JsonCodec.deserialize(&text).unwrap(), value);
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let v = JsonCodec.deserialize("  {\"a\":1}\r").unwrap();
        assert_eq!(v, json!({"a": 1}));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            JsonCodec.deserialize("{\"type\":"),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn frozen_payload_matches_value() {
        let p = JsonCodec.deserialize_frozen("[1,2,3]").unwrap();
        assert_eq!(*p, json!([1, 2, 3]));
    }
}
