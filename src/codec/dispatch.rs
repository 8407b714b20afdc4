//! Payload codec dispatch
//!
//! Routes a message payload through the decoder its schema names. Decode
//! failures never abort a stream: the row is kept with an `_error` column
//! describing the failure, so one corrupt payload does not hide the rest
//! of a recording. Unsupported encodings yield no value at all and the
//! caller surfaces the raw bytes instead.

use serde_json::{json, Value};
use tracing::warn;

use super::sanitize::strip_nul;
use super::schemarec::RecordSchema;
use crate::container::SchemaRecord;

/// Column name carrying a decode failure description
pub const ERROR_COLUMN: &str = "_error";

/// Decodes message payloads per schema encoding
pub struct PayloadCodec;

impl PayloadCodec {
    /// Decodes `payload` according to `schema.encoding`.
    ///
    /// Returns None for encodings this codec does not understand; the
    /// message should then be exposed undecoded.
    pub fn decode(schema: &SchemaRecord, payload: &[u8]) -> Option<Value> {
        match schema.encoding.as_str() {
            "record" => Some(Self::decode_record(schema, payload)),
            "json" => Some(Self::decode_json(payload)),
            _ => None,
        }
    }

    fn decode_record(schema: &SchemaRecord, payload: &[u8]) -> Value {
        let parsed = match RecordSchema::parse(&schema.descriptor) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(schema = %schema.name, error = %e, "unusable record descriptor");
                return json!({ ERROR_COLUMN: format!("record_decode_failed: {}", e) });
            }
        };
        match parsed.decode(payload) {
            Ok(value) => strip_nul(value),
            Err(e) => {
                warn!(schema = %schema.name, error = %e, "record payload decode failed");
                json!({ ERROR_COLUMN: format!("record_decode_failed: {}", e) })
            }
        }
    }

    fn decode_json(payload: &[u8]) -> Value {
        match serde_json::from_slice::<Value>(payload) {
            Ok(value) => strip_nul(value),
            Err(e) => {
                warn!(error = %e, "json payload decode failed");
                json!({ ERROR_COLUMN: format!("json_decode_failed: {}", e) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(encoding: &str, descriptor: &[u8]) -> SchemaRecord {
        SchemaRecord {
            id: 1,
            name: "test.Schema".to_string(),
            encoding: encoding.to_string(),
            descriptor: descriptor.to_vec(),
        }
    }

    #[test]
    fn test_json_payload_decodes_and_sanitizes() {
        let s = schema("json", b"");
        let decoded = PayloadCodec::decode(&s, br#"{"name": "a\u0000b"}"#).unwrap();
        assert_eq!(decoded, json!({"name": "ab"}));
    }

    #[test]
    fn test_json_failure_yields_error_row() {
        let s = schema("json", b"");
        let decoded = PayloadCodec::decode(&s, b"{not json").unwrap();
        let text = decoded[ERROR_COLUMN].as_str().unwrap();
        assert!(text.starts_with("json_decode_failed:"));
    }

    #[test]
    fn test_record_payload_decodes() {
        let s = schema("record", b"count int64\n");
        let mut payload = Vec::new();
        payload.extend_from_slice(&9i64.to_le_bytes());
        let decoded = PayloadCodec::decode(&s, &payload).unwrap();
        assert_eq!(decoded, json!({"count": 9}));
    }

    #[test]
    fn test_record_failure_yields_error_row() {
        let s = schema("record", b"count int64\n");
        let decoded = PayloadCodec::decode(&s, &[1, 2, 3]).unwrap();
        let text = decoded[ERROR_COLUMN].as_str().unwrap();
        assert!(text.starts_with("record_decode_failed:"));
    }

    #[test]
    fn test_unsupported_encoding_yields_none() {
        let s = schema("flatbuffer", b"");
        assert!(PayloadCodec::decode(&s, b"\x01\x02").is_none());
    }
}
