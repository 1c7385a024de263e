// src/rpc_client.rs

use crate::metrics;
use crate::serde_helpers::deserialize_present;
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_tungstenite::tungstenite::Message;

pub const JSONRPC_VERSION: &str = "2.0";

const MAX_REPORTED_BODY_CHARS: usize = 512;

/// Outbound JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Vec<Value>,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponseBody {
    #[serde(default)]
    id: Option<Value>,
    // `null` is a legitimate result; only a missing key means the node had no answer.
    #[serde(default, deserialize_with = "deserialize_present")]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl RpcResponseBody {
    fn into_result(self) -> Result<Value, EndpointFailure> {
        match self.result {
            Some(result) => Ok(result),
            None => Err(EndpointFailure::MissingResult { error: self.error }),
        }
    }
}

/// Why a single endpoint attempt was discarded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EndpointFailure {
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error("Invalid response body: {0}")]
    InvalidResponse(String),
    #[error("Response has no result (error: {error:?})")]
    MissingResult { error: Option<Value> },
    #[error("Unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),
}

impl EndpointFailure {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::HttpStatus { .. } => "http_status",
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::InvalidResponse(_) => "invalid_response",
            Self::MissingResult { .. } => "missing_result",
            Self::UnsupportedScheme(_) => "unsupported_scheme",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RpcError {
    #[error("API endpoints not provided")]
    NoEndpointsConfigured,
    #[error("All API endpoint requests failed for {method} ({} endpoints)", .endpoints.len())]
    AllEndpointsFailed { method: String, endpoints: Vec<String> },
}

/// Receives every discarded endpoint attempt.
pub trait FailureSink: Send + Sync {
    fn report(&self, endpoint: &str, request: &RpcRequest, failure: &EndpointFailure);
}

/// Default sink: one warning per failed attempt, with credentials masked.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFailureSink;

impl FailureSink for LogFailureSink {
    fn report(&self, endpoint: &str, request: &RpcRequest, failure: &EndpointFailure) {
        warn!(
            "RPC {} (id={}) failed on {}: {}",
            request.method,
            request.id,
            mask_endpoint(endpoint),
            failure
        );
    }
}

/// JSON-RPC client that walks an ordered endpoint list until one answers.
///
/// Endpoints are tried strictly one after another, never in parallel and never twice
/// within one `send`. The first endpoint returning a `result` wins. Each attempt has its
/// own hard timeout, after which the next endpoint is tried.
///
/// `http(s)://` endpoints share one pooled `reqwest::Client`; `ws(s)://` endpoints open a
/// connection per request.
///
/// ## Usage
///
/// ```rust,ignore
/// let client = ResilientRpcClient::new();
/// let request = client.request("eth_blockNumber", vec![]);
/// let result = client.send(&request, &endpoints, Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct ResilientRpcClient {
    http: reqwest::Client,
    next_id: Arc<AtomicU64>,
    sink: Arc<dyn FailureSink>,
}

impl Default for ResilientRpcClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ResilientRpcClient {
    pub fn new() -> Self {
        Self::with_http_client(reqwest::Client::new())
    }

    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self {
            http,
            next_id: Arc::new(AtomicU64::new(1)),
            sink: Arc::new(LogFailureSink),
        }
    }

    /// Replace the sink that receives per-endpoint failures.
    pub fn with_failure_sink(mut self, sink: Arc<dyn FailureSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Builds a request with a fresh id.
    pub fn request(&self, method: &str, params: Vec<Value>) -> RpcRequest {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        RpcRequest::new(id, method, params)
    }

    pub async fn send(
        &self,
        request: &RpcRequest,
        endpoints: &[String],
        timeout: Duration,
    ) -> Result<Value, RpcError> {
        if endpoints.is_empty() {
            return Err(RpcError::NoEndpointsConfigured);
        }

        metrics::increment_rpc_call(&request.method);
        let started = Instant::now();
        let mut attempted = Vec::with_capacity(endpoints.len());

        for endpoint in endpoints {
            attempted.push(endpoint.clone());
            debug!(
                "RPC {} (id={}) -> {}",
                request.method,
                request.id,
                mask_endpoint(endpoint)
            );

            let outcome = match tokio::time::timeout(timeout, self.attempt(endpoint, request)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(EndpointFailure::Timeout(timeout)),
            };

            match outcome {
                Ok(result) => {
                    metrics::record_rpc_call_latency(&request.method, started.elapsed());
                    return Ok(result);
                }
                Err(failure) => {
                    metrics::increment_endpoint_failure(&mask_endpoint(endpoint), failure.reason());
                    self.sink.report(endpoint, request, &failure);
                }
            }
        }

        metrics::increment_all_endpoints_failed(&request.method);
        Err(RpcError::AllEndpointsFailed {
            method: request.method.clone(),
            endpoints: attempted,
        })
    }

    async fn attempt(&self, endpoint: &str, request: &RpcRequest) -> Result<Value, EndpointFailure> {
        let scheme = endpoint.split("://").next().unwrap_or_default().to_ascii_lowercase();
        match scheme.as_str() {
            "http" | "https" => self.post_http(endpoint, request).await,
            "ws" | "wss" => exchange_ws(endpoint, request).await,
            _ => Err(EndpointFailure::UnsupportedScheme(mask_endpoint(endpoint))),
        }
    }

    async fn post_http(&self, endpoint: &str, request: &RpcRequest) -> Result<Value, EndpointFailure> {
        let response = self
            .http
            .post(endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| EndpointFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EndpointFailure::HttpStatus {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        let body: RpcResponseBody = response
            .json()
            .await
            .map_err(|e| EndpointFailure::InvalidResponse(e.to_string()))?;
        body.into_result()
    }
}

async fn exchange_ws(endpoint: &str, request: &RpcRequest) -> Result<Value, EndpointFailure> {
    let (mut stream, _) = tokio_tungstenite::connect_async(endpoint)
        .await
        .map_err(|e| EndpointFailure::Transport(e.to_string()))?;

    let payload =
        serde_json::to_string(request).map_err(|e| EndpointFailure::InvalidResponse(e.to_string()))?;
    stream
        .send(Message::Text(payload))
        .await
        .map_err(|e| EndpointFailure::Transport(e.to_string()))?;

    let expected_id = Value::from(request.id);
    while let Some(frame) = stream.next().await {
        let text = match frame.map_err(|e| EndpointFailure::Transport(e.to_string()))? {
            Message::Text(text) => text,
            Message::Binary(bytes) => String::from_utf8(bytes)
                .map_err(|e| EndpointFailure::InvalidResponse(e.to_string()))?,
            Message::Close(_) => break,
            _ => continue,
        };

        let body: RpcResponseBody = serde_json::from_str(&text)
            .map_err(|e| EndpointFailure::InvalidResponse(format!("{}: {}", e, truncate(&text))))?;
        // Subscription notifications and stray frames carry other ids.
        if body.id.as_ref().map_or(true, |id| *id == expected_id) {
            let _ = stream.close(None).await;
            return body.into_result();
        }
    }

    Err(EndpointFailure::Transport(
        "connection closed before a response arrived".to_string(),
    ))
}

/// Hides path, query and credentials of an endpoint URL (API keys usually live there).
pub fn mask_endpoint(endpoint: &str) -> String {
    match url::Url::parse(endpoint) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
            let has_secret = parsed.path().len() > 1
                || parsed.query().is_some()
                || !parsed.username().is_empty()
                || parsed.password().is_some();
            if has_secret {
                format!("{}://{}{}/...", parsed.scheme(), host, port)
            } else {
                format!("{}://{}{}", parsed.scheme(), host, port)
            }
        }
        Err(_) => "<invalid endpoint>".to_string(),
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_REPORTED_BODY_CHARS).collect()
}
