//! HTTP transport over the telemetry REST API

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::Value;
use tracing::debug;

use super::{Transport, TransportError, TransportResult};
use crate::config::ApiConfig;

/// Blocking HTTP client with bearer auth
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn check(response: Response) -> TransportResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(TransportError::UpstreamRequestFailed {
            status: status.as_u16(),
            body,
        })
    }

    fn parse_json(response: Response) -> TransportResult<Value> {
        response
            .json()
            .map_err(|e| TransportError::Request(e.to_string()))
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str, params: &BTreeMap<String, Value>) -> TransportResult<Value> {
        let url = self.url(path);
        debug!(%url, ?params, "GET");
        let query: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.clone(), param_text(v)))
            .collect();
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&query)
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Self::parse_json(Self::check(response)?)
    }

    fn post(&self, path: &str, body: &Value) -> TransportResult<Value> {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Self::parse_json(Self::check(response)?)
    }

    fn download(&self, url: &str) -> TransportResult<Vec<u8>> {
        debug!(%url, "download");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let bytes = Self::check(response)?
            .bytes()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Query-string form of a compiled parameter value.
fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
