//! Upstream API transport
//!
//! The query pipeline talks to the telemetry service through this trait so
//! tests can substitute a canned transport and assert on exactly which
//! requests the compiler produced.

mod http;

pub use http::HttpTransport;

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The service answered with a non-success status.
    #[error("upstream request failed with status {status}: {body}")]
    UpstreamRequestFailed { status: u16, body: String },

    /// The request never completed (connect, timeout, body read).
    #[error("transport error: {0}")]
    Request(String),
}

/// Blocking transport to the telemetry API
pub trait Transport {
    /// GET a resource collection; returns the parsed JSON body.
    fn get(&self, path: &str, params: &BTreeMap<String, Value>) -> TransportResult<Value>;

    /// POST a JSON body; returns the parsed JSON response.
    fn post(&self, path: &str, body: &Value) -> TransportResult<Value>;

    /// Fetch raw bytes from an absolute URL (pre-signed download links).
    fn download(&self, url: &str) -> TransportResult<Vec<u8>>;
}
