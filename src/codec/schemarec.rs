//! Positional record codec
//!
//! The "record" encoding describes payloads with a line-oriented schema
//! descriptor: one `name kind` pair per line, kinds drawn from bool,
//! int64, float64, string. Payload bytes carry the field values in
//! declaration order with no per-field tags. Writers may omit a suffix of
//! trailing fields; readers materialize those as the kind's default so
//! every decoded row has the full column set.

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("bad schema descriptor line {line}: {text}")]
    BadDescriptor { line: usize, text: String },

    #[error("field '{field}' cut short: need {need} bytes, have {have}")]
    FieldTruncated {
        field: String,
        need: usize,
        have: usize,
    },

    #[error("field '{field}' is not valid UTF-8")]
    BadString { field: String },

    #[error("{extra} bytes of trailing junk after the last field")]
    TrailingJunk { extra: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Bool,
    Int64,
    Float64,
    Str,
}

impl FieldKind {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "bool" => Some(FieldKind::Bool),
            "int64" => Some(FieldKind::Int64),
            "float64" => Some(FieldKind::Float64),
            "string" => Some(FieldKind::Str),
            _ => None,
        }
    }

    fn default_value(self) -> Value {
        match self {
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Int64 => Value::Number(Number::from(0)),
            FieldKind::Float64 => json_f64(0.0),
            FieldKind::Str => Value::String(String::new()),
        }
    }
}

#[derive(Debug, Clone)]
struct Field {
    name: String,
    kind: FieldKind,
}

/// Parsed record schema
#[derive(Debug, Clone)]
pub struct RecordSchema {
    fields: Vec<Field>,
}

impl RecordSchema {
    /// Parses a descriptor. Blank lines are ignored; anything else must be
    /// exactly `name kind`.
    pub fn parse(descriptor: &[u8]) -> Result<Self, RecordError> {
        let text = std::str::from_utf8(descriptor).map_err(|_| RecordError::BadDescriptor {
            line: 0,
            text: "descriptor is not UTF-8".to_string(),
        })?;
        let mut fields = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let entry = match (parts.next(), parts.next(), parts.next()) {
                (Some(name), Some(kind), None) => FieldKind::parse(kind).map(|kind| Field {
                    name: name.to_string(),
                    kind,
                }),
                _ => None,
            };
            match entry {
                Some(field) => fields.push(field),
                None => {
                    return Err(RecordError::BadDescriptor {
                        line: idx + 1,
                        text: line.to_string(),
                    })
                }
            }
        }
        Ok(Self { fields })
    }

    /// Decodes one payload into an object with every declared field
    /// present. The payload may stop at any field boundary; it may not
    /// stop inside a field or run past the last one.
    pub fn decode(&self, payload: &[u8]) -> Result<Value, RecordError> {
        let mut out = Map::new();
        let mut pos = 0usize;
        let mut exhausted = false;
        for field in &self.fields {
            if pos == payload.len() {
                exhausted = true;
            }
            if exhausted {
                out.insert(field.name.clone(), field.kind.default_value());
                continue;
            }
            let value = match field.kind {
                FieldKind::Bool => {
                    let b = take(payload, &mut pos, 1, &field.name)?;
                    Value::Bool(b[0] != 0)
                }
                FieldKind::Int64 => {
                    let b = take(payload, &mut pos, 8, &field.name)?;
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(b);
                    Value::Number(Number::from(i64::from_le_bytes(raw)))
                }
                FieldKind::Float64 => {
                    let b = take(payload, &mut pos, 8, &field.name)?;
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(b);
                    json_f64(f64::from_le_bytes(raw))
                }
                FieldKind::Str => {
                    let b = take(payload, &mut pos, 4, &field.name)?;
                    let len = u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize;
                    let bytes = take(payload, &mut pos, len, &field.name)?;
                    let text =
                        std::str::from_utf8(bytes).map_err(|_| RecordError::BadString {
                            field: field.name.clone(),
                        })?;
                    Value::String(text.to_string())
                }
            };
            out.insert(field.name.clone(), value);
        }
        if pos < payload.len() {
            return Err(RecordError::TrailingJunk {
                extra: payload.len() - pos,
            });
        }
        Ok(Value::Object(out))
    }
}

fn take<'a>(
    payload: &'a [u8],
    pos: &mut usize,
    n: usize,
    field: &str,
) -> Result<&'a [u8], RecordError> {
    if *pos + n > payload.len() {
        return Err(RecordError::FieldTruncated {
            field: field.to_string(),
            need: n,
            have: payload.len() - *pos,
        });
    }
    let slice = &payload[*pos..*pos + n];
    *pos += n;
    Ok(slice)
}

/// Non-finite floats have no JSON form; they decode to null.
fn json_f64(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}
