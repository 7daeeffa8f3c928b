//! Webhook request proxy
//!
//! Forwards a search body to one configured automation webhook and folds
//! every upstream quirk into one reply contract:
//! - a success status always carries the usable JSON payload
//! - `[]` is the canonical "no results" payload
//! - failures carry `{"error": ...}` (plus `details` for raw text)
//!
//! The forwarder never returns an error value; every path yields a
//! [`ProxyReply`].

mod envelope;

pub use envelope::{classify_response, Envelope};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

use crate::metrics;

/// Message returned whenever the upstream could not be reached or read
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred";

/// Which search upstream a forwarder talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamKind {
    /// Contract award records (proxy A)
    Contracts,
    /// Company research summaries (proxy B)
    Research,
}

impl UpstreamKind {
    /// Stable name used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamKind::Contracts => "contracts",
            UpstreamKind::Research => "research",
        }
    }

    /// Human-readable label used to attribute failures
    pub fn label(&self) -> &'static str {
        match self {
            UpstreamKind::Contracts => "Contract search",
            UpstreamKind::Research => "Company research",
        }
    }

    /// Gateway route that proxies this upstream
    pub fn route(&self) -> &'static str {
        match self {
            UpstreamKind::Contracts => "/api/search-first",
            UpstreamKind::Research => "/api/search-second",
        }
    }

    /// Envelope handling used for this upstream
    pub fn mode(&self) -> EnvelopeMode {
        match self {
            UpstreamKind::Contracts => EnvelopeMode::Enhanced,
            UpstreamKind::Research => EnvelopeMode::Standard,
        }
    }

    fn not_configured_message(&self) -> String {
        format!("{} webhook URL is not configured", self.label())
    }
}

/// How much of the automation tool's output shape the proxy unwraps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeMode {
    /// Success bodies pass through untouched
    Standard,
    /// Sends `Accept: application/json` and unwraps `{ value, Count }`
    Enhanced,
}

/// Uniform proxy result: a status plus a JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyReply {
    pub status: StatusCode,
    pub body: Value,
}

impl ProxyReply {
    /// Successful reply carrying `body`
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// Successful reply with the canonical empty result
    pub fn empty() -> Self {
        Self::ok(Value::Array(Vec::new()))
    }

    /// Failed reply with `{"error": message}`
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    /// Failed reply with `{"error": message, "details": details}`
    pub fn error_with_details(
        status: StatusCode,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            status,
            body: json!({ "error": message.into(), "details": details.into() }),
        }
    }

    /// Generic 500 used for transport failures
    pub fn internal() -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Best-effort human-readable failure message from the body
    pub fn error_message(&self) -> String {
        fn text(value: &Value) -> Option<String> {
            match value {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                Value::Object(map) => map.get("message").and_then(text),
                _ => None,
            }
        }

        self.body
            .get("error")
            .and_then(text)
            .or_else(|| self.body.get("message").and_then(text))
            .unwrap_or_else(|| format!("Request failed with status {}", self.status.as_u16()))
    }
}

impl IntoResponse for ProxyReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Forwards search bodies to one configured webhook
pub struct WebhookForwarder {
    client: reqwest::Client,
    kind: UpstreamKind,
    url: Option<String>,
}

impl WebhookForwarder {
    /// Create a forwarder; `url = None` leaves it unconfigured
    pub fn new(kind: UpstreamKind, url: Option<String>, timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self::with_client(client, kind, url))
    }

    /// Create a forwarder sharing an existing HTTP client
    pub fn with_client(client: reqwest::Client, kind: UpstreamKind, url: Option<String>) -> Self {
        let url = url.filter(|u| !u.trim().is_empty());
        Self { client, kind, url }
    }

    pub fn kind(&self) -> UpstreamKind {
        self.kind
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    /// Relay `body` to the webhook and classify whatever comes back
    pub async fn forward(&self, body: &Value) -> ProxyReply {
        let Some(url) = self.url.as_deref() else {
            tracing::error!(upstream = self.kind.as_str(), "Webhook URL is not configured");
            metrics::record_upstream_call(self.kind.as_str(), "not_configured", None);
            return ProxyReply::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                self.kind.not_configured_message(),
            );
        };

        let start = Instant::now();
        let reply = match self.send(url, body).await {
            Ok((status, text)) => classify_response(self.kind.mode(), status, &text),
            Err(e) => {
                tracing::error!(
                    upstream = self.kind.as_str(),
                    error = %e,
                    "Webhook request failed"
                );
                ProxyReply::internal()
            }
        };
        let elapsed = start.elapsed();

        tracing::info!(
            upstream = self.kind.as_str(),
            status = reply.status.as_u16(),
            latency_ms = elapsed.as_millis() as u64,
            "Webhook call completed"
        );
        metrics::record_upstream_call(
            self.kind.as_str(),
            outcome_class(&reply),
            Some(elapsed.as_secs_f64()),
        );

        reply
    }

    async fn send(&self, url: &str, body: &Value) -> Result<(StatusCode, String), reqwest::Error> {
        let mut request = self
            .client
            .post(url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/json; charset=utf-8",
            )
            .body(body.to_string());

        if self.kind.mode() == EnvelopeMode::Enhanced {
            request = request.header(reqwest::header::ACCEPT, "application/json");
        }

        let response = request.send().await?;
        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let text = response.text().await?;

        Ok((status, text))
    }
}

fn outcome_class(reply: &ProxyReply) -> &'static str {
    if reply.is_success() {
        match &reply.body {
            Value::Array(items) if items.is_empty() => "empty",
            _ => "success",
        }
    } else if reply.status.is_server_error() {
        "server_error"
    } else {
        "client_error"
    }
}
