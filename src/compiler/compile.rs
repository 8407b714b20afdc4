//! Qualifier compilation
//!
//! Turns a conjunction of qualifiers plus an optional sort request into the
//! parameter set for one upstream call. Push-down here is best-effort: the
//! verifier re-checks every qualifier against every returned row, so a
//! qualifier the upstream ignores or honors approximately can never leak a
//! non-matching row.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use super::fieldmap::{FieldMap, WindowRule};
use super::range::RangeState;
use crate::planner::{Operator, PlanError, PlanResult, Qualifier, SortKey};
use crate::timefmt;

/// Upstream sort parameter names, shared by every list endpoint
const SORT_BY_PARAM: &str = "sortBy";
const SORT_ORDER_PARAM: &str = "sortOrder";

/// Pseudo-column capping emitted rows
const LIMIT_COLUMN: &str = "limit";

/// Prefix for per-key metadata pseudo-columns (`metadata_robot = 'r2'`)
const METADATA_PREFIX: &str = "metadata_";

/// Result of compiling one query against a field map
#[derive(Debug, Clone)]
pub struct CompiledRequest {
    /// Upstream parameters, deterministic order
    pub params: BTreeMap<String, Value>,
    /// Whether the requested sort was pushed upstream; when false and a
    /// sort was requested, the caller must sort locally
    pub sort_pushed: bool,
    /// Row cap, applied client-side regardless of upstream support
    pub limit: Option<u64>,
    /// Which qualifiers were mapped into `params`, by position.
    /// Informational only: the verifier re-checks all of them.
    pub satisfied: Vec<bool>,
}

/// Compiles qualifiers into upstream request parameters
pub struct QualifierCompiler;

impl QualifierCompiler {
    /// Compile `quals` and the first of `sortkeys` against `map`.
    ///
    /// `now` is the compile-time instant used for window synthesis; callers
    /// outside tests pass `Utc::now()`.
    pub fn compile(
        quals: &[Qualifier],
        sortkeys: &[SortKey],
        map: &FieldMap,
        now: DateTime<Utc>,
    ) -> PlanResult<CompiledRequest> {
        let mut params: BTreeMap<String, Value> = map
            .base_params
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        let mut satisfied = vec![false; quals.len()];
        let mut range = RangeState::new();
        let mut lower_only: BTreeMap<&'static str, String> = BTreeMap::new();
        let mut multi: BTreeMap<&'static str, Vec<Value>> = BTreeMap::new();
        let mut tokens: Vec<String> = Vec::new();
        let mut limit: Option<u64> = None;

        for (idx, qual) in quals.iter().enumerate() {
            if let Some(interval) = &map.interval {
                if qual.field == interval.start_column || qual.field == interval.end_column {
                    if Self::accumulate_bound(qual, interval.start_column, &mut range)? {
                        satisfied[idx] = true;
                    }
                    continue;
                }
            }

            if let Some(param) = map.lower_only_param(&qual.field) {
                // Only lower bounds are pushable for these columns; the
                // verifier still enforces any upper bound locally.
                if matches!(qual.op, Operator::Gt | Operator::Gte | Operator::Eq) {
                    let wire = timefmt::normalize_value(&qual.field, &qual.value)?;
                    let entry = lower_only.entry(param).or_default();
                    if wire > *entry {
                        *entry = wire;
                    }
                    satisfied[idx] = true;
                }
                continue;
            }

            if let Some(md) = &map.metadata {
                if qual.field == md.column && qual.op == Operator::Contains {
                    Self::containment_tokens(&qual.value, &mut tokens);
                    satisfied[idx] = true;
                    continue;
                }
                if qual.field == md.column && qual.op == Operator::Eq {
                    if let Value::String(s) = &qual.value {
                        // Unstructured token search
                        tokens.push(s.clone());
                        satisfied[idx] = true;
                    }
                    continue;
                }
                if let Some(key) = qual.field.strip_prefix(METADATA_PREFIX) {
                    if qual.op == Operator::Eq {
                        tokens.push(format!("{}:{}", key, list_text(&qual.value)));
                        satisfied[idx] = true;
                    }
                    continue;
                }
            }

            if qual.op != Operator::Eq {
                continue;
            }

            if qual.field == LIMIT_COLUMN {
                if let Some(n) = as_u64(&qual.value) {
                    limit = Some(n);
                    satisfied[idx] = true;
                }
                continue;
            }

            if let Some(param) = map.multi_equality_param(&qual.field) {
                multi.entry(param).or_default().push(qual.value.clone());
                satisfied[idx] = true;
                continue;
            }

            if let Some(param) = map.equality_param(&qual.field) {
                // Last wins when the same column is qualified twice.
                params.insert(param.to_string(), qual.value.clone());
                satisfied[idx] = true;
            }
        }

        Self::enforce_window(map, &mut params, &mut range, now)?;

        if let Some(interval) = &map.interval {
            if let Some(wire) = range.lower_wire() {
                params.insert(interval.start_param.to_string(), Value::String(wire));
            }
            if let Some(wire) = range.upper_wire() {
                params.insert(interval.end_param.to_string(), Value::String(wire));
            }
        }
        for (param, wire) in lower_only {
            params.insert(param.to_string(), Value::String(wire));
        }
        for (param, values) in multi {
            params.insert(param.to_string(), Value::Array(values));
        }
        if let Some(md) = &map.metadata {
            if !tokens.is_empty() {
                params.insert(md.param.to_string(), Value::String(tokens.join(" ")));
            }
        }
        if let (Some(param), Some(n)) = (map.limit_param, limit) {
            params.insert(param.to_string(), Value::from(n));
        }

        let mut sort_pushed = false;
        if let Some(sk) = sortkeys.first() {
            // Single-key sort is the upstream's limit; further keys are dropped.
            if let Some(field) = map.sort_param(&sk.field) {
                params.insert(SORT_BY_PARAM.to_string(), Value::String(field.to_string()));
                params.insert(
                    SORT_ORDER_PARAM.to_string(),
                    Value::String(sk.direction.as_str().to_string()),
                );
                sort_pushed = true;
            }
        }

        let params_json = Value::Object(
            params.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        );
        debug!(table = map.table, params = %params_json, "compiled upstream request");

        Ok(CompiledRequest {
            params,
            sort_pushed,
            limit,
            satisfied,
        })
    }

    /// Route one interval-column comparison to the correct accumulator side.
    ///
    /// `>`/`>=` tighten the lower bound and `<`/`<=` the upper bound on both
    /// interval columns: "end >= X" bounds the window's lower edge exactly
    /// as "start >= X" does, because the upstream window semantics are
    /// inclusive overlap. Equality on the start column pins both edges;
    /// on the end column only the upper edge.
    fn accumulate_bound(
        qual: &Qualifier,
        start_column: &str,
        range: &mut RangeState,
    ) -> PlanResult<bool> {
        let instant = match qual.op {
            Operator::Contains => return Ok(false),
            _ => timefmt::parse_value(&qual.value).ok_or_else(|| {
                PlanError::malformed_timestamp(&qual.field, qual.value.to_string())
            })?,
        };
        match qual.op {
            Operator::Gt | Operator::Gte => range.tighten_lower(instant),
            Operator::Lt | Operator::Lte => range.tighten_upper(instant),
            Operator::Eq => {
                range.tighten_upper(instant);
                if qual.field == start_column {
                    range.tighten_lower(instant);
                }
            }
            Operator::Contains => unreachable!(),
        }
        Ok(true)
    }

    /// Apply the table's window rule: synthesize missing bounds or fail
    /// fast when the upstream would reject the request.
    fn enforce_window(
        map: &FieldMap,
        params: &mut BTreeMap<String, Value>,
        range: &mut RangeState,
        now: DateTime<Utc>,
    ) -> PlanResult<()> {
        let rule = map.interval.map(|i| i.rule).unwrap_or(WindowRule::None);
        match rule {
            WindowRule::None => Ok(()),
            WindowRule::PairIfPresent => {
                range.synthesize(now);
                Ok(())
            }
            WindowRule::Required => {
                if !range.has_any() {
                    return Err(PlanError::missing_selector(
                        map.table,
                        "supply a time bound (start_time and/or end_time) to form the \
                         required start/end parameters",
                    ));
                }
                range.synthesize(now);
                Ok(())
            }
            WindowRule::Selector => {
                let sel = match map.selector.as_ref() {
                    // A selector window without a selector rule degrades to
                    // an unconstrained window.
                    None => return Ok(()),
                    Some(sel) => sel,
                };
                let has_ident = sel.identifiers.iter().any(|p| params.contains_key(*p));
                if has_ident {
                    // Identified requests may carry a partial window as-is.
                    return Ok(());
                }
                let has_scoped = sel.scoped.iter().any(|p| params.contains_key(*p));
                if !has_scoped {
                    return Err(PlanError::missing_selector(map.table, sel.message));
                }
                if sel.synthesize_window {
                    if !range.has_any() {
                        return Err(PlanError::missing_selector(map.table, sel.message));
                    }
                    range.synthesize(now);
                } else if !range.is_complete() {
                    return Err(PlanError::missing_selector(map.table, sel.message));
                }
                Ok(())
            }
        }
    }

    /// Flatten a containment object into `key:value` query tokens.
    fn containment_tokens(value: &Value, tokens: &mut Vec<String>) {
        let parsed;
        let object = match value {
            Value::Object(map) => map,
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => {
                    parsed = map;
                    &parsed
                }
                _ => return,
            },
            _ => return,
        };
        for (key, v) in object {
            if v.is_null() {
                continue;
            }
            tokens.push(format!("{}:{}", key, list_text(v)));
        }
    }
}

/// Scalar-or-list token text: lists are comma-joined, scalars rendered
/// without JSON quoting.
fn list_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(","),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::fieldmap::{IntervalMap, MetadataMap, SelectorRule};
    use chrono::TimeZone;
    use serde_json::json;

    const INTERVAL: IntervalMap = IntervalMap {
        start_column: "start_time",
        end_column: "end_time",
        start_param: "start",
        end_param: "end",
        rule: WindowRule::PairIfPresent,
    };

    const EVENTS: FieldMap = FieldMap {
        table: "events",
        base_params: &[],
        equality: &[("device_id", "deviceId"), ("device_name", "deviceName")],
        multi_equality: &[],
        sortable: &[("start_time", "start"), ("created_at", "createdAt")],
        interval: Some(INTERVAL),
        lower_only: &[("created_at", "createdAfter"), ("updated_at", "updatedAfter")],
        metadata: Some(MetadataMap {
            column: "metadata",
            param: "query",
        }),
        limit_param: Some("limit"),
        selector: None,
    };

    const TOPICS: FieldMap = FieldMap {
        table: "topics",
        base_params: &[("includeSchemas", "false")],
        equality: &[
            ("device_id", "deviceId"),
            ("recording_id", "recordingId"),
        ],
        multi_equality: &[],
        sortable: &[],
        interval: Some(IntervalMap {
            start_column: "start_time",
            end_column: "end_time",
            start_param: "start",
            end_param: "end",
            rule: WindowRule::Selector,
        }),
        lower_only: &[],
        metadata: None,
        limit_param: Some("limit"),
        selector: Some(SelectorRule {
            identifiers: &["recordingId"],
            scoped: &["deviceId"],
            synthesize_window: false,
            message: "provide recording_id OR device_id plus both time bounds",
        }),
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 9, 12, 0, 0).unwrap()
    }

    fn compile(quals: &[Qualifier], map: &FieldMap) -> CompiledRequest {
        QualifierCompiler::compile(quals, &[], map, now()).unwrap()
    }

    #[test]
    fn test_equality_pushdown_last_wins() {
        let quals = vec![
            Qualifier::eq("device_id", json!("dev_1")),
            Qualifier::eq("device_id", json!("dev_2")),
        ];
        let req = compile(&quals, &EVENTS);
        assert_eq!(req.params["deviceId"], json!("dev_2"));
        assert_eq!(req.satisfied, vec![true, true]);
    }

    #[test]
    fn test_bound_tightening_is_order_independent() {
        let a = vec![
            Qualifier::gte("start_time", json!("2025-08-01T00:00:00Z")),
            Qualifier::gt("start_time", json!("2025-08-05T00:00:00Z")),
            Qualifier::lte("end_time", json!("2025-08-20T00:00:00Z")),
            Qualifier::lt("end_time", json!("2025-08-15T00:00:00Z")),
        ];
        let mut b = a.clone();
        b.reverse();
        let req_a = compile(&a, &EVENTS);
        let req_b = compile(&b, &EVENTS);
        assert_eq!(req_a.params["start"], json!("2025-08-05T00:00:00Z"));
        assert_eq!(req_a.params["end"], json!("2025-08-15T00:00:00Z"));
        assert_eq!(req_a.params, req_b.params);
    }

    #[test]
    fn test_cross_mapping_end_lower_bound() {
        // end_time >= X bounds the window's lower edge.
        let quals = vec![Qualifier::gte("end_time", json!("2025-08-05T00:00:00Z"))];
        let req = compile(&quals, &EVENTS);
        assert_eq!(req.params["start"], json!("2025-08-05T00:00:00Z"));
    }

    #[test]
    fn test_equality_on_start_pins_both_edges() {
        let quals = vec![Qualifier::eq("start_time", json!("2025-08-05T00:00:00Z"))];
        let req = compile(&quals, &EVENTS);
        assert_eq!(req.params["start"], json!("2025-08-05T00:00:00Z"));
        assert_eq!(req.params["end"], json!("2025-08-05T00:00:00Z"));
    }

    #[test]
    fn test_missing_upper_synthesized_to_now() {
        let quals = vec![Qualifier::gte("start_time", json!("2025-08-01T00:00:00Z"))];
        let req = compile(&quals, &EVENTS);
        assert_eq!(req.params["end"], json!("2025-08-09T12:00:00Z"));
    }

    #[test]
    fn test_missing_lower_synthesized_to_epoch() {
        let quals = vec![Qualifier::lt("end_time", json!("2025-08-09T00:00:00Z"))];
        let req = compile(&quals, &EVENTS);
        assert_eq!(req.params["start"], json!("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn test_malformed_timestamp_is_fatal() {
        let quals = vec![Qualifier::gte("start_time", json!("last tuesday"))];
        let err = QualifierCompiler::compile(&quals, &[], &EVENTS, now()).unwrap_err();
        assert!(matches!(err, PlanError::MalformedTimestamp { .. }));
        assert!(err.to_string().contains("last tuesday"));
    }

    #[test]
    fn test_lower_only_takes_max_and_ignores_upper() {
        let quals = vec![
            Qualifier::gte("created_at", json!("2025-08-01T00:00:00Z")),
            Qualifier::gt("created_at", json!("2025-08-03T00:00:00Z")),
            Qualifier::lt("created_at", json!("2025-08-09T00:00:00Z")),
        ];
        let req = compile(&quals, &EVENTS);
        assert_eq!(req.params["createdAfter"], json!("2025-08-03T00:00:00Z"));
        // The upper bound was not pushed and stays local-only.
        assert_eq!(req.satisfied, vec![true, true, false]);
    }

    #[test]
    fn test_containment_tokens() {
        let quals = vec![Qualifier::contains(
            "metadata",
            json!({"robot": "r2", "run": ["a", "b"], "tag": "*", "skip": null}),
        )];
        let req = compile(&quals, &EVENTS);
        let query = req.params["query"].as_str().unwrap();
        assert!(query.contains("robot:r2"));
        assert!(query.contains("run:a,b"));
        assert!(query.contains("tag:*"));
        assert!(!query.contains("skip"));
    }

    #[test]
    fn test_metadata_pseudo_column() {
        let quals = vec![Qualifier::eq("metadata_robot", json!("r2"))];
        let req = compile(&quals, &EVENTS);
        assert_eq!(req.params["query"], json!("robot:r2"));
    }

    #[test]
    fn test_limit_pseudo_column() {
        let quals = vec![Qualifier::eq("limit", json!(100))];
        let req = compile(&quals, &EVENTS);
        assert_eq!(req.limit, Some(100));
        assert_eq!(req.params["limit"], json!(100));
    }

    #[test]
    fn test_sort_pushdown_first_key_only() {
        let sortkeys = vec![SortKey::desc("created_at"), SortKey::asc("start_time")];
        let req = QualifierCompiler::compile(&[], &sortkeys, &EVENTS, now()).unwrap();
        assert!(req.sort_pushed);
        assert_eq!(req.params["sortBy"], json!("createdAt"));
        assert_eq!(req.params["sortOrder"], json!("desc"));
    }

    #[test]
    fn test_unsortable_field_not_pushed() {
        let sortkeys = vec![SortKey::asc("metadata")];
        let req = QualifierCompiler::compile(&[], &sortkeys, &EVENTS, now()).unwrap();
        assert!(!req.sort_pushed);
        assert!(!req.params.contains_key("sortBy"));
    }

    #[test]
    fn test_selector_missing_fails_fast() {
        let err = QualifierCompiler::compile(&[], &[], &TOPICS, now()).unwrap_err();
        assert!(matches!(err, PlanError::MissingRequiredSelector { .. }));
    }

    #[test]
    fn test_selector_satisfied_by_identifier() {
        let quals = vec![Qualifier::eq("recording_id", json!("rec_1"))];
        let req = compile(&quals, &TOPICS);
        assert_eq!(req.params["recordingId"], json!("rec_1"));
        // No window synthesis for identified requests.
        assert!(!req.params.contains_key("start"));
    }

    #[test]
    fn test_selector_scoped_requires_complete_window() {
        let quals = vec![
            Qualifier::eq("device_id", json!("dev_1")),
            Qualifier::gte("start_time", json!("2025-08-01T00:00:00Z")),
        ];
        let err = QualifierCompiler::compile(&quals, &[], &TOPICS, now()).unwrap_err();
        assert!(matches!(err, PlanError::MissingRequiredSelector { .. }));

        let quals = vec![
            Qualifier::eq("device_id", json!("dev_1")),
            Qualifier::gte("start_time", json!("2025-08-01T00:00:00Z")),
            Qualifier::lte("end_time", json!("2025-08-09T00:00:00Z")),
        ];
        let req = compile(&quals, &TOPICS);
        assert_eq!(req.params["start"], json!("2025-08-01T00:00:00Z"));
        assert_eq!(req.params["end"], json!("2025-08-09T00:00:00Z"));
    }

    #[test]
    fn test_base_params_always_present() {
        let quals = vec![Qualifier::eq("recording_id", json!("rec_1"))];
        let req = compile(&quals, &TOPICS);
        assert_eq!(req.params["includeSchemas"], json!("false"));
    }
}
