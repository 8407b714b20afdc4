//! Timestamp normalization
//!
//! The upstream API speaks RFC 3339 UTC at whole-second granularity, e.g.
//! `2025-08-09T20:20:12Z`. Host-supplied values arrive in looser shapes:
//! space-separated date/time, short numeric offsets like `-07`, or no
//! timezone at all. Everything is normalized to a canonical UTC instant.
//!
//! Timezone-naive inputs are interpreted as UTC, never local time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::planner::{PlanError, PlanResult};

/// Fixed lower bound used when the upstream mandates a paired range and the
/// query supplied only an upper bound.
pub const EPOCH_START: &str = "1970-01-01T00:00:00Z";

/// Format an instant as the canonical wire string, truncating sub-second
/// precision (the upstream contract granularity).
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Interpret a timezone-naive instant as UTC.
pub fn naive_as_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    naive.and_utc()
}

/// Parse a timestamp string into an aware UTC instant.
///
/// Never errors; returns `None` when no parse strategy succeeds. Callers
/// that compare timestamps treat `None` as "skip this check", not a failure.
pub fn parse_str(input: &str) -> Option<DateTime<Utc>> {
    let mut s = input.trim().to_string();
    // Tolerate "YYYY-MM-DD HH:MM:SS" by treating the first space as the
    // date/time separator.
    if !s.contains('T') && s.contains(' ') {
        s = s.replacen(' ', "T", 1);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&s) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Short numeric offsets ("-07", "+0530") that RFC 3339 parsing rejects.
    if let Ok(parsed) = DateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f%#z") {
        return Some(parsed.with_timezone(&Utc));
    }
    // No timezone indicator: naive, interpreted as UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive_as_utc(naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        return Some(naive_as_utc(date.and_hms_opt(0, 0, 0)?));
    }
    None
}

/// Parse a qualifier operand into an aware UTC instant.
///
/// Only string values are parseable; anything else yields `None`.
pub fn parse_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_str(s),
        _ => None,
    }
}

/// Normalize a qualifier operand to the canonical wire string.
///
/// Fails with [`PlanError::MalformedTimestamp`] when the value cannot be
/// parsed; the offending column and value are carried for the caller.
pub fn normalize_value(field: &str, value: &Value) -> PlanResult<String> {
    parse_value(value)
        .map(format_instant)
        .ok_or_else(|| PlanError::malformed_timestamp(field, value.to_string()))
}
