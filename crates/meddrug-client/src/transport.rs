//! Transport client for the analysis backend.
//!
//! `send` is the only suspension point of the orchestration layer. Every
//! failure is reported once to the notification channel and returned as a
//! `TransportError`; nothing is retried here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use meddrug_common::config::BackendConfig;
use meddrug_common::TransportError;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::notify::{Notification, Notifier};
use crate::wire::{Endpoint, HttpMethod, WireDialect};

/// Shown when a failed response carries no usable message.
pub const GENERIC_ERROR: &str = "An unexpected error occurred";

/// A successful backend response, still in backend shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    async fn send(&self, endpoint: Endpoint, payload: &Value) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport. Holds the only process-wide piece of state:
/// the connection configuration.
pub struct HttpTransport {
    base_url: String,
    dialect: WireDialect,
    client: reqwest::Client,
    notifier: Arc<dyn Notifier>,
}

impl HttpTransport {
    pub fn new(config: &BackendConfig, notifier: Arc<dyn Notifier>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError {
                message: format!("Failed to build HTTP client: {e}"),
                status: None,
            })?;

        Ok(Self {
            base_url: config.base_url.clone(),
            dialect: WireDialect::from_config(config),
            client,
            notifier,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn fail(&self, endpoint: Endpoint, err: TransportError) -> TransportError {
        warn!(endpoint = endpoint.name(), status = ?err.status, "Backend call failed: {}", err.message);
        self.notifier.notify(Notification::error(err.message.clone()));
        err
    }
}

#[async_trait]
impl AnalysisTransport for HttpTransport {
    #[instrument(skip(self, payload), fields(endpoint = endpoint.name()))]
    async fn send(&self, endpoint: Endpoint, payload: &Value) -> Result<RawResponse, TransportError> {
        let url = self.dialect.url(&self.base_url, endpoint);
        debug!(url = %url, "Sending backend request");

        let request = match endpoint.method() {
            HttpMethod::Get => self.client
                .get(&url)
                .header(CONTENT_TYPE, "application/json")
                .query(&query_pairs(payload)),
            HttpMethod::Post => self.client
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .json(payload),
        };

        let resp = match request.send().await {
            Ok(r) => r,
            Err(e) if e.is_builder() => {
                return Err(self.fail(endpoint, TransportError {
                    message: format!("Invalid request: {e}"),
                    status: None,
                }));
            }
            Err(e) => {
                debug!(error = %e, "No response from backend");
                return Err(self.fail(endpoint, TransportError::network()));
            }
        };

        let status = resp.status().as_u16();
        let success = resp.status().is_success();
        let text = match resp.text().await {
            Ok(t) => t,
            Err(e) => {
                debug!(error = %e, "Response body could not be read");
                return Err(self.fail(endpoint, TransportError::network()));
            }
        };
        let body: Option<Value> = serde_json::from_str(&text).ok();

        if !success {
            let message = body
                .as_ref()
                .and_then(extract_error_message)
                .unwrap_or_else(|| GENERIC_ERROR.to_string());
            return Err(self.fail(endpoint, TransportError::backend(status, message)));
        }

        match body {
            Some(body) => Ok(RawResponse { status, body }),
            None => Err(self.fail(
                endpoint,
                TransportError::backend(status, "Backend returned a malformed response body"),
            )),
        }
    }
}

/// Human-readable message from an error body. FastAPI-style `detail` is
/// either a string or a list of `{msg}` objects.
pub fn extract_error_message(body: &Value) -> Option<String> {
    let message = match &body["detail"] {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(|i| i["msg"].as_str()).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
    .or_else(|| body["message"].as_str().map(String::from))
    .or_else(|| body["error"]["message"].as_str().map(String::from))
    .or_else(|| body["error"].as_str().map(String::from))?;

    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

/// Flatten a JSON object into query parameters, skipping nulls.
fn query_pairs(payload: &Value) -> Vec<(String, String)> {
    let Some(map) = payload.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}
