//! Table catalog and query pipeline
//!
//! Every list-style resource runs the same pipeline: compile qualifiers
//! into one upstream request, fetch, post-process rows, re-verify every
//! qualifier locally, sort locally if the sort was not pushed, project to
//! the declared column set, and cap to the requested limit. The tables
//! differ only in their capability data, never in pipeline code.

mod attachments;
mod coverage;
mod devices;
mod events;
pub mod messages;
mod recordings;
mod topics;

pub use messages::MessageScan;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::compiler::{FieldMap, QualifierCompiler};
use crate::container::ContainerError;
use crate::planner::{PlanError, Qualifier, SortKey};
use crate::transport::{Transport, TransportError};
use crate::verifier::{RowSorter, RowVerifier};

/// A materialized row
pub type Row = Map<String, Value>;

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("unexpected response shape from '{path}': {detail}")]
    BadResponse { path: String, detail: String },
}

/// Static description of one list-style table
pub struct TableDef {
    /// Upstream collection path, relative to the API base
    pub path: &'static str,
    /// Declared column set, in output order
    pub columns: &'static [&'static str],
    /// Columns whose range qualifiers compare as timestamps
    pub time_columns: &'static [&'static str],
    /// Push-down capability table
    pub fields: FieldMap,
    /// Row fixup applied before verification (computed columns,
    /// shape normalization)
    pub postprocess: Option<fn(&mut Row)>,
    /// Compiled parameters echoed back as columns the upstream does not
    /// return itself: (parameter name, column name)
    pub echo_params: &'static [(&'static str, &'static str)],
}

/// All list-style tables, by name
pub fn lookup(table: &str) -> Option<&'static TableDef> {
    match table {
        "devices" => Some(&devices::DEF),
        "events" => Some(&events::DEF),
        "recordings" => Some(&recordings::DEF),
        "coverage" => Some(&coverage::DEF),
        "topics" => Some(&topics::DEF),
        "attachments" => Some(&attachments::DEF),
        _ => None,
    }
}

/// Names of every table, the streaming one included
pub fn table_names() -> &'static [&'static str] {
    &[
        "devices",
        "events",
        "recordings",
        "coverage",
        "topics",
        "attachments",
        "messages",
    ]
}

impl TableDef {
    /// Runs the full query pipeline for this table.
    pub fn scan(
        &self,
        transport: &dyn Transport,
        quals: &[Qualifier],
        sortkeys: &[SortKey],
    ) -> QueryResult<Vec<Row>> {
        let compiled =
            QualifierCompiler::compile(quals, sortkeys, &self.fields, chrono::Utc::now())?;
        let response = transport.get(self.path, &compiled.params)?;
        let mut rows = self.extract_rows(response)?;

        if let Some(fix) = self.postprocess {
            for row in &mut rows {
                fix(row);
            }
        }

        for (param, column) in self.echo_params {
            if let Some(value) = compiled.params.get(*param) {
                for row in &mut rows {
                    row.entry((*column).to_string())
                        .or_insert_with(|| value.clone());
                }
            }
        }

        let before = rows.len();
        rows.retain(|row| RowVerifier::accepts(row, quals, self.time_columns));
        debug!(
            table = self.fields.table,
            fetched = before,
            kept = rows.len(),
            "verified upstream rows"
        );

        if !compiled.sort_pushed {
            if let Some(sk) = sortkeys.first() {
                RowSorter::sort(&mut rows, &sk.field, sk.direction.is_descending());
            }
        }

        if let Some(limit) = compiled.limit {
            rows.truncate(limit as usize);
        }

        Ok(rows.into_iter().map(|row| self.project(row)).collect())
    }

    /// Pull the row array out of the response body. Endpoints answer with
    /// either a bare array or an object wrapping one.
    fn extract_rows(&self, response: Value) -> QueryResult<Vec<Row>> {
        let items = match response {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("items").or_else(|| map.remove("data")) {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(QueryError::BadResponse {
                        path: self.path.to_string(),
                        detail: "object response without an items array".to_string(),
                    })
                }
            },
            other => {
                return Err(QueryError::BadResponse {
                    path: self.path.to_string(),
                    detail: format!("expected an array, got {}", kind_name(&other)),
                })
            }
        };
        // Non-object entries are dropped rather than failing the scan.
        Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }

    /// Projects to the declared columns, materializing explicit nulls so
    /// every emitted row has an identical shape.
    fn project(&self, mut row: Row) -> Row {
        let mut out = Map::with_capacity(self.columns.len());
        for col in self.columns {
            let value = row.remove(*col).unwrap_or(Value::Null);
            out.insert((*col).to_string(), value);
        }
        out
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renames `from` to `to` when present; upstream payloads use camelCase
/// while the declared columns are snake_case.
pub(crate) fn rename(row: &mut Row, from: &str, to: &str) {
    if let Some(value) = row.remove(from) {
        row.insert(to.to_string(), value);
    }
}
