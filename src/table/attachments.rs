//! Recording attachments table

use super::{rename, Row, TableDef};
use crate::compiler::FieldMap;

pub(super) const DEF: TableDef = TableDef {
    path: "recording-attachments",
    columns: &[
        "id",
        "recording_id",
        "name",
        "media_type",
        "log_time",
        "size",
        "crc",
        "created_at",
    ],
    time_columns: &["log_time", "created_at"],
    fields: FieldMap {
        table: "attachments",
        base_params: &[],
        equality: &[("recording_id", "recordingId"), ("device_id", "deviceId")],
        multi_equality: &[],
        sortable: &[("log_time", "logTime"), ("created_at", "createdAt"), ("name", "name")],
        interval: None,
        lower_only: &[],
        metadata: None,
        limit_param: Some("limit"),
        selector: None,
    },
    postprocess: Some(fixup),
    echo_params: &[],
};

fn fixup(row: &mut Row) {
    rename(row, "recordingId", "recording_id");
    rename(row, "mediaType", "media_type");
    rename(row, "logTime", "log_time");
    rename(row, "createdAt", "created_at");
}
