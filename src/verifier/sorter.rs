//! Local sort fallback
//!
//! Used whenever a requested sort could not be pushed upstream. Ordering is
//! a stable total order over the string form of the sort column; missing
//! and null values compare as the empty string, so they sort first in
//! ascending order. Keeping this deterministic here (rather than relying on
//! the host's own sort node) keeps single-key ordering stable even when
//! multiple tables cooperate in one query plan.

use serde_json::{Map, Value};

/// Sorts materialized rows by one column
pub struct RowSorter;

impl RowSorter {
    /// Stable in-place sort by `field` in the requested direction.
    pub fn sort(rows: &mut [Map<String, Value>], field: &str, descending: bool) {
        rows.sort_by(|a, b| {
            let ordering = sort_text(a, field).cmp(&sort_text(b, field));
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
}

fn sort_text(row: &Map<String, Value>, field: &str) -> String {
    match row.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(values: &[Value]) -> Vec<Map<String, Value>> {
        values
            .iter()
            .map(|v| {
                let mut row = Map::new();
                if !v.is_null() {
                    row.insert("size".to_string(), v.clone());
                }
                row
            })
            .collect()
    }

    fn sizes(rows: &[Map<String, Value>]) -> Vec<Value> {
        rows.iter()
            .map(|r| r.get("size").cloned().unwrap_or(Value::Null))
            .collect()
    }

    #[test]
    fn test_missing_value_sorts_first_ascending() {
        let mut data = rows(&[json!(3), json!(null), json!(1)]);
        RowSorter::sort(&mut data, "size", false);
        assert_eq!(sizes(&data), vec![json!(null), json!(1), json!(3)]);
    }

    #[test]
    fn test_descending_reverses() {
        let mut data = rows(&[json!(3), json!(null), json!(1)]);
        RowSorter::sort(&mut data, "size", true);
        assert_eq!(sizes(&data), vec![json!(3), json!(1), json!(null)]);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let source = rows(&[json!("b"), json!("a"), json!("c"), json!("a")]);
        let mut first = source.clone();
        let mut second = source.clone();
        RowSorter::sort(&mut first, "size", false);
        RowSorter::sort(&mut second, "size", false);
        assert_eq!(first, second);
        assert_eq!(
            sizes(&first),
            vec![json!("a"), json!("a"), json!("b"), json!("c")]
        );
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let mut data = rows(&[json!("x"), json!("x")]);
        data[0].insert("id".to_string(), json!(1));
        data[1].insert("id".to_string(), json!(2));
        RowSorter::sort(&mut data, "size", false);
        assert_eq!(data[0]["id"], json!(1));
        assert_eq!(data[1]["id"], json!(2));
    }
}
