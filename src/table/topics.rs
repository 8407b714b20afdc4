//! Topics table
//!
//! The upstream refuses unscoped topic listings: a request must name a
//! recording, or name a device together with a fully explicit time window.
//! Schemas are never requested here; the messages table carries them.

use super::{rename, Row, TableDef};
use crate::compiler::{FieldMap, IntervalMap, SelectorRule, WindowRule};

pub(super) const DEF: TableDef = TableDef {
    path: "data/topics",
    columns: &["topic", "version", "schema_name", "schema_encoding"],
    time_columns: &[],
    fields: FieldMap {
        table: "topics",
        base_params: &[("includeSchemas", "false")],
        equality: &[
            ("device_id", "deviceId"),
            ("device_name", "deviceName"),
            ("recording_id", "recordingId"),
            ("recording_key", "recordingKey"),
            ("project_id", "projectId"),
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
            identifiers: &["recordingId", "recordingKey"],
            scoped: &["deviceId", "deviceName"],
            synthesize_window: false,
            message: "topics require recording_id or recording_key, or a device \
                      (device_id or device_name) together with explicit \
                      start_time and end_time bounds",
        }),
    },
    postprocess: Some(fixup),
    echo_params: &[],
};

fn fixup(row: &mut Row) {
    rename(row, "schemaName", "schema_name");
    rename(row, "schemaEncoding", "schema_encoding");
}
