//! Recordings table

use serde_json::Value;

use super::{rename, Row, TableDef};
use crate::compiler::{FieldMap, IntervalMap, WindowRule};
use crate::timefmt;

pub(super) const DEF: TableDef = TableDef {
    path: "recordings",
    columns: &[
        "id",
        "path",
        "device_id",
        "start_time",
        "end_time",
        "duration",
        "size",
        "import_status",
        "metadata",
        "created_at",
    ],
    time_columns: &["start_time", "end_time", "created_at"],
    fields: FieldMap {
        table: "recordings",
        base_params: &[],
        equality: &[
            ("device_id", "deviceId"),
            ("path", "path"),
            ("project_id", "projectId"),
            ("import_status", "importStatus"),
        ],
        multi_equality: &[],
        sortable: &[
            ("path", "path"),
            ("device_id", "deviceId"),
            ("start_time", "start"),
            ("created_at", "createdAt"),
        ],
        interval: Some(IntervalMap {
            start_column: "start_time",
            end_column: "end_time",
            start_param: "start",
            end_param: "end",
            rule: WindowRule::PairIfPresent,
        }),
        lower_only: &[],
        metadata: None,
        limit_param: Some("limit"),
        selector: None,
    },
    postprocess: Some(fixup),
    echo_params: &[],
};

fn fixup(row: &mut Row) {
    rename(row, "deviceId", "device_id");
    rename(row, "start", "start_time");
    rename(row, "end", "end_time");
    rename(row, "importStatus", "import_status");
    rename(row, "createdAt", "created_at");

    // Computed column: recording span in whole seconds, null when either
    // edge is absent or unparsable.
    let duration = span_seconds(row.get("start_time"), row.get("end_time"));
    row.insert(
        "duration".to_string(),
        duration.map_or(Value::Null, Value::from),
    );
}

fn span_seconds(start: Option<&Value>, end: Option<&Value>) -> Option<i64> {
    let start = start.and_then(timefmt::parse_value)?;
    let end = end.and_then(timefmt::parse_value)?;
    Some((end - start).num_seconds())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duration_computed() {
        let mut row = json!({
            "start": "2025-08-09T10:00:00Z",
            "end": "2025-08-09T10:05:30Z"
        })
        .as_object()
        .unwrap()
        .clone();
        fixup(&mut row);
        assert_eq!(row["duration"], json!(330));
        assert_eq!(row["start_time"], json!("2025-08-09T10:00:00Z"));
    }

    #[test]
    fn test_duration_null_without_end() {
        let mut row = json!({"start": "2025-08-09T10:00:00Z"})
            .as_object()
            .unwrap()
            .clone();
        fixup(&mut row);
        assert_eq!(row["duration"], json!(null));
    }
}
