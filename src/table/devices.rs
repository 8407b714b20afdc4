//! Device registry table

use super::{rename, Row, TableDef};
use crate::compiler::FieldMap;

pub(super) const DEF: TableDef = TableDef {
    path: "devices",
    columns: &["id", "name", "project_id", "properties", "created_at", "updated_at"],
    time_columns: &[],
    fields: FieldMap {
        table: "devices",
        base_params: &[],
        // Name equality rides the upstream's fuzzy `query` parameter; the
        // post-filter narrows it back to exact matches.
        equality: &[("name", "query"), ("project_id", "projectId")],
        multi_equality: &[],
        sortable: &[("id", "id"), ("name", "name")],
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
    rename(row, "projectId", "project_id");
    rename(row, "createdAt", "created_at");
    rename(row, "updatedAt", "updated_at");
}
