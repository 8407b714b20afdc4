//! Coverage table
//!
//! Reports which time ranges hold data per device. The upstream requires a
//! complete window, so a single bound is synthesized to a full one and an
//! unbounded scan is refused. Gap tolerance rides along as a pseudo-column
//! with an upstream default of 30 seconds.

use super::{rename, Row, TableDef};
use crate::compiler::{FieldMap, IntervalMap, WindowRule};

pub(super) const DEF: TableDef = TableDef {
    path: "data/coverage",
    columns: &[
        "device_id",
        "device_name",
        "start_time",
        "end_time",
        "import_status",
        "tolerance",
        "status",
    ],
    time_columns: &["start_time", "end_time"],
    fields: FieldMap {
        table: "coverage",
        // Edge recordings are included so importStatus comes back per range.
        base_params: &[("tolerance", "30"), ("includeEdgeRecordings", "true")],
        equality: &[
            ("device_id", "deviceId"),
            ("device_name", "deviceName"),
            ("tolerance", "tolerance"),
        ],
        multi_equality: &[],
        sortable: &[],
        interval: Some(IntervalMap {
            start_column: "start_time",
            end_column: "end_time",
            start_param: "start",
            end_param: "end",
            rule: WindowRule::Required,
        }),
        lower_only: &[],
        metadata: None,
        limit_param: None,
        selector: None,
    },
    postprocess: Some(fixup),
    // The effective tolerance is a request property, not part of the
    // response; it is echoed onto every row.
    echo_params: &[("tolerance", "tolerance")],
};

fn fixup(row: &mut Row) {
    rename(row, "deviceId", "device_id");
    rename(row, "deviceName", "device_name");
    rename(row, "start", "start_time");
    rename(row, "end", "end_time");
    rename(row, "importStatus", "import_status");
}
