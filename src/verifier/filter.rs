//! Local post-filter over materialized rows
//!
//! Every qualifier is re-evaluated against every candidate row, regardless
//! of whether it was pushed upstream. Push-down success does not guarantee
//! exact enforcement (inclusive/exclusive bound drift, approximate token
//! matching), so the uniform re-check is the correctness backstop.

use serde_json::{Map, Value};

use crate::planner::{Operator, Qualifier};
use crate::timefmt;

/// Re-evaluates qualifiers against rows
pub struct RowVerifier;

impl RowVerifier {
    /// Checks a row against all qualifiers (AND semantics).
    ///
    /// `time_columns` names the columns whose range comparisons are
    /// timestamp-valued; range qualifiers on other columns are not checked
    /// here (the host runtime owns them).
    pub fn accepts(
        row: &Map<String, Value>,
        quals: &[Qualifier],
        time_columns: &[&str],
    ) -> bool {
        quals
            .iter()
            .all(|qual| Self::check(row, qual, time_columns))
    }

    fn check(row: &Map<String, Value>, qual: &Qualifier, time_columns: &[&str]) -> bool {
        match qual.op {
            Operator::Eq => match row.get(&qual.field) {
                Some(actual) => text(actual) == text(&qual.value),
                // Pseudo-columns (limit, tolerance) never materialize.
                None => true,
            },
            Operator::Contains => Self::check_containment(row, qual),
            _ if time_columns.contains(&qual.field.as_str()) => {
                let lhs = row.get(&qual.field).and_then(timefmt::parse_value);
                let rhs = timefmt::parse_value(&qual.value);
                match (lhs, rhs) {
                    (Some(lhs), Some(rhs)) => match qual.op {
                        Operator::Gt => lhs > rhs,
                        Operator::Gte => lhs >= rhs,
                        Operator::Lt => lhs < rhs,
                        Operator::Lte => lhs <= rhs,
                        _ => unreachable!(),
                    },
                    // Unparsable operand: prefer a false positive over
                    // discarding a possibly-valid row.
                    _ => true,
                }
            }
            _ => true,
        }
    }

    /// Containment check mirroring the token push-down exactly: required
    /// key present, value a member of a list target, wildcard passes on
    /// presence alone.
    fn check_containment(row: &Map<String, Value>, qual: &Qualifier) -> bool {
        let want = match as_object(&qual.value) {
            Some(map) => map,
            // Malformed qualifier target: nothing to enforce.
            None => return true,
        };
        let target = match row.get(&qual.field).and_then(|v| as_object(v)) {
            Some(map) => map,
            None => return false,
        };
        for (key, want_value) in &want {
            let actual = match target.get(key) {
                Some(v) => v,
                None => return false,
            };
            match want_value {
                Value::Array(options) => {
                    if !options.iter().any(|opt| text(opt) == text(actual)) {
                        return false;
                    }
                }
                Value::String(s) if s == "*" => {}
                other => {
                    if text(other) != text(actual) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

fn as_object(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// String-normalized scalar text, so numeric/string type drift upstream
/// does not cause false rejects (row value 42 matches qualifier "42").
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TIME_COLUMNS: &[&str] = &["start_time", "end_time"];

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_equality_match_and_reject() {
        let r = row(json!({"device_id": "dev_1"}));
        assert!(RowVerifier::accepts(
            &r,
            &[Qualifier::eq("device_id", json!("dev_1"))],
            TIME_COLUMNS
        ));
        assert!(!RowVerifier::accepts(
            &r,
            &[Qualifier::eq("device_id", json!("dev_2"))],
            TIME_COLUMNS
        ));
    }

    #[test]
    fn test_cross_type_equality_matches() {
        let r = row(json!({"sequence_id": 42}));
        assert!(RowVerifier::accepts(
            &r,
            &[Qualifier::eq("sequence_id", json!("42"))],
            TIME_COLUMNS
        ));
    }

    #[test]
    fn test_range_on_time_column() {
        let r = row(json!({"start_time": "2025-08-09T10:00:00Z"}));
        assert!(RowVerifier::accepts(
            &r,
            &[Qualifier::gte("start_time", json!("2025-08-09T00:00:00Z"))],
            TIME_COLUMNS
        ));
        assert!(!RowVerifier::accepts(
            &r,
            &[Qualifier::lt("start_time", json!("2025-08-09T00:00:00Z"))],
            TIME_COLUMNS
        ));
    }

    #[test]
    fn test_unparsable_timestamp_passes() {
        let r = row(json!({"start_time": "2025-08-09T10:00:00Z"}));
        assert!(RowVerifier::accepts(
            &r,
            &[Qualifier::lt("start_time", json!("not a timestamp"))],
            TIME_COLUMNS
        ));

        let r = row(json!({"start_time": "garbled"}));
        assert!(RowVerifier::accepts(
            &r,
            &[Qualifier::lt("start_time", json!("2025-08-09T00:00:00Z"))],
            TIME_COLUMNS
        ));
    }

    #[test]
    fn test_containment_membership_and_wildcard() {
        let r = row(json!({"metadata": {"robot": "r2", "run": "a"}}));
        assert!(RowVerifier::accepts(
            &r,
            &[Qualifier::contains("metadata", json!({"robot": "r2"}))],
            TIME_COLUMNS
        ));
        assert!(RowVerifier::accepts(
            &r,
            &[Qualifier::contains("metadata", json!({"run": ["a", "b"]}))],
            TIME_COLUMNS
        ));
        assert!(RowVerifier::accepts(
            &r,
            &[Qualifier::contains("metadata", json!({"robot": "*"}))],
            TIME_COLUMNS
        ));
        assert!(!RowVerifier::accepts(
            &r,
            &[Qualifier::contains("metadata", json!({"robot": "r3"}))],
            TIME_COLUMNS
        ));
        assert!(!RowVerifier::accepts(
            &r,
            &[Qualifier::contains("metadata", json!({"absent": "*"}))],
            TIME_COLUMNS
        ));
    }

    #[test]
    fn test_containment_accepts_json_string_row_value() {
        let r = row(json!({"metadata": "{\"robot\":\"r2\"}"}));
        assert!(RowVerifier::accepts(
            &r,
            &[Qualifier::contains("metadata", json!({"robot": "r2"}))],
            TIME_COLUMNS
        ));
    }

    #[test]
    fn test_pseudo_column_qualifier_passes() {
        let r = row(json!({"device_id": "dev_1"}));
        assert!(RowVerifier::accepts(
            &r,
            &[Qualifier::eq("limit", json!(10))],
            TIME_COLUMNS
        ));
    }
}
