//! NUL sanitizer
//!
//! Host text types reject embedded U+0000, but telemetry payloads carry
//! them freely (fixed-width firmware strings, binary-ish labels). Strip
//! the character from every string leaf before a value crosses into the
//! host. Strings without NULs are passed through untouched.

use serde_json::Value;

/// Removes U+0000 from all string leaves, recursing through arrays and
/// objects. Keys are sanitized too.
pub fn strip_nul(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(clean(s)),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nul).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (clean(k), strip_nul(v)))
                .collect(),
        ),
        other => other,
    }
}

fn clean(s: String) -> String {
    if s.contains('\0') {
        s.chars().filter(|&c| c != '\0').collect()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_nul_from_nested_strings() {
        let dirty = json!({
            "name": "imu\u{0}\u{0}",
            "tags": ["a\u{0}b", "clean"],
            "inner": {"k\u{0}ey": "v\u{0}"}
        });
        assert_eq!(
            strip_nul(dirty),
            json!({
                "name": "imu",
                "tags": ["ab", "clean"],
                "inner": {"key": "v"}
            })
        );
    }

    #[test]
    fn test_clean_value_unchanged() {
        let clean = json!({"name": "imu", "count": 3, "ok": true, "none": null});
        assert_eq!(strip_nul(clean.clone()), clean);
    }
}
