//! Streaming messages table
//!
//! Unlike the list tables, messages are served as one binary container:
//! the export endpoint answers with a pre-signed link, the link downloads
//! the container, and rows come out of a lazy decode of its frames. The
//! row iterator stops decoding as soon as the consumer stops pulling, so a
//! LIMIT 10 over a multi-gigabyte recording decodes ten messages.

use chrono::{SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use super::{QueryError, QueryResult, Row};
use crate::codec::PayloadCodec;
use crate::compiler::{
    CompiledRequest, FieldMap, IntervalMap, QualifierCompiler, SelectorRule, WindowRule,
};
use crate::container::{ContainerReader, StreamedMessage};
use crate::planner::Qualifier;
use crate::transport::Transport;
use crate::verifier::RowVerifier;

/// Export endpoint answering with a download link
const STREAM_PATH: &str = "data/stream";

/// Declared column set, in output order
pub const COLUMNS: &[&str] = &[
    "topic",
    "schema_name",
    "encoding",
    "log_time",
    "sequence",
    "channel_id",
    "schema_id",
    "device_id",
    "device_name",
    "recording_id",
    "recording_key",
    "data",
];

const TIME_COLUMNS: &[&str] = &["log_time"];

/// Selector parameters echoed back as columns; the container itself does
/// not carry them.
const ECHO_PARAMS: &[(&str, &str)] = &[
    ("deviceId", "device_id"),
    ("deviceName", "device_name"),
    ("recordingId", "recording_id"),
    ("recordingKey", "recording_key"),
];

/// Push-down surface for the export request body. Both interval columns
/// are `log_time`: its lower and upper bounds form the window directly.
const FIELDS: FieldMap = FieldMap {
    table: "messages",
    base_params: &[("outputFormat", "tlc")],
    equality: &[
        ("device_id", "deviceId"),
        ("device_name", "deviceName"),
        ("recording_id", "recordingId"),
        ("recording_key", "recordingKey"),
    ],
    multi_equality: &[("topic", "topics")],
    sortable: &[],
    interval: Some(IntervalMap {
        start_column: "log_time",
        end_column: "log_time",
        start_param: "start",
        end_param: "end",
        rule: WindowRule::Selector,
    }),
    lower_only: &[],
    metadata: None,
    limit_param: None,
    selector: Some(SelectorRule {
        identifiers: &["recordingId", "recordingKey"],
        scoped: &["deviceId", "deviceName"],
        synthesize_window: true,
        message: "messages require recording_id or recording_key, or a device \
                  (device_id or device_name) together with at least one \
                  log_time bound",
    }),
};

/// Lazy scan over one exported container
pub struct MessageScan;

impl MessageScan {
    /// Compiles the export request, fetches the container, and returns the
    /// row iterator. Selector failures surface before any network call.
    pub fn scan(transport: &dyn Transport, quals: &[Qualifier]) -> QueryResult<MessageRows> {
        let compiled = QualifierCompiler::compile(quals, &[], &FIELDS, Utc::now())?;
        let body = request_body(&compiled);
        let response = transport.post(STREAM_PATH, &body)?;
        let link = response
            .get("link")
            .and_then(Value::as_str)
            .ok_or_else(|| QueryError::BadResponse {
                path: STREAM_PATH.to_string(),
                detail: "response without a 'link' field".to_string(),
            })?;
        debug!(%link, "downloading exported container");
        let bytes = transport.download(link)?;
        let reader = ContainerReader::new(bytes)?;
        let echoes = ECHO_PARAMS
            .iter()
            .map(|(param, column)| {
                let value = compiled.params.get(*param).cloned().unwrap_or(Value::Null);
                (column.to_string(), value)
            })
            .collect();
        Ok(MessageRows {
            reader,
            quals: quals.to_vec(),
            echoes,
            remaining: compiled.limit,
        })
    }
}

/// The compiled parameter map, re-shaped as the export's JSON body.
fn request_body(compiled: &CompiledRequest) -> Value {
    let map: Map<String, Value> = compiled
        .params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Value::Object(map)
}

/// Iterator of verified, projected message rows
#[derive(Debug)]
pub struct MessageRows {
    reader: ContainerReader,
    quals: Vec<Qualifier>,
    echoes: Vec<(String, Value)>,
    remaining: Option<u64>,
}

impl MessageRows {
    /// Records skipped by the underlying container decode so far.
    pub fn skipped(&self) -> u64 {
        self.reader.skipped()
    }

    fn to_row(&self, streamed: StreamedMessage) -> Row {
        let mut row = Map::with_capacity(COLUMNS.len());
        row.insert(
            "topic".to_string(),
            Value::String(streamed.channel.topic.clone()),
        );
        row.insert(
            "schema_name".to_string(),
            Value::String(streamed.schema.name.clone()),
        );
        row.insert(
            "encoding".to_string(),
            Value::String(streamed.schema.encoding.clone()),
        );
        row.insert(
            "log_time".to_string(),
            Value::String(wire_nanos(streamed.message.log_time_nanos)),
        );
        row.insert(
            "sequence".to_string(),
            Value::from(streamed.message.sequence),
        );
        row.insert(
            "channel_id".to_string(),
            Value::from(streamed.channel.id),
        );
        row.insert("schema_id".to_string(), Value::from(streamed.schema.id));
        for (column, value) in &self.echoes {
            row.insert(column.clone(), value.clone());
        }
        // Undecodable-encoding payloads keep a null data column; the
        // encoding column says why.
        let data = PayloadCodec::decode(&streamed.schema, &streamed.message.payload)
            .unwrap_or(Value::Null);
        row.insert("data".to_string(), data);
        row
    }
}

impl Iterator for MessageRows {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }
        loop {
            let streamed = self.reader.next()?;
            let row = self.to_row(streamed);
            if !RowVerifier::accepts(&row, &self.quals, TIME_COLUMNS) {
                continue;
            }
            if let Some(n) = self.remaining.as_mut() {
                *n -= 1;
            }
            return Some(row);
        }
    }
}

/// Nanosecond-precision wire timestamp for message log times.
fn wire_nanos(nanos: u64) -> String {
    Utc.timestamp_nanos(nanos as i64)
        .to_rfc3339_opts(SecondsFormat::Nanos, true)
}
