//! Events table
//!
//! The richest push-down surface: an optional time window, lower-only
//! bounds on the audit columns, and metadata containment compiled into the
//! token query parameter.

use super::{rename, Row, TableDef};
use crate::compiler::{FieldMap, IntervalMap, MetadataMap, WindowRule};

pub(super) const DEF: TableDef = TableDef {
    path: "events",
    columns: &[
        "id",
        "device_id",
        "device_name",
        "start_time",
        "end_time",
        "metadata",
        "created_at",
        "updated_at",
    ],
    time_columns: &["start_time", "end_time", "created_at", "updated_at"],
    fields: FieldMap {
        table: "events",
        base_params: &[],
        equality: &[("device_id", "deviceId"), ("device_name", "deviceName")],
        multi_equality: &[],
        sortable: &[
            ("id", "id"),
            ("device_id", "deviceId"),
            ("device_name", "deviceName"),
            ("start_time", "start"),
            ("created_at", "createdAt"),
            ("updated_at", "updatedAt"),
        ],
        interval: Some(IntervalMap {
            start_column: "start_time",
            end_column: "end_time",
            start_param: "start",
            end_param: "end",
            rule: WindowRule::PairIfPresent,
        }),
        lower_only: &[("created_at", "createdAfter"), ("updated_at", "updatedAfter")],
        metadata: Some(MetadataMap {
            column: "metadata",
            param: "query",
        }),
        limit_param: Some("limit"),
        selector: None,
    },
    postprocess: Some(fixup),
    echo_params: &[],
};

fn fixup(row: &mut Row) {
    rename(row, "deviceId", "device_id");
    rename(row, "deviceName", "device_name");
    rename(row, "start", "start_time");
    rename(row, "end", "end_time");
    rename(row, "createdAt", "created_at");
    rename(row, "updatedAt", "updated_at");
}
