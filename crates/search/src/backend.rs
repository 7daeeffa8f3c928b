//! Where the orchestrator sends its two calls
//!
//! Both implementations speak the proxy reply contract: a status plus a JSON
//! body, never a raw transport error.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tenderlens_common::{
    auth::IssuedSession,
    upstream::{ProxyReply, UpstreamKind, WebhookForwarder},
};

use crate::query::UpstreamQuery;

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Call proxy A (contract awards)
    async fn contracts(&self, query: &UpstreamQuery) -> ProxyReply;

    /// Call proxy B (company research)
    async fn research(&self, query: &UpstreamQuery) -> ProxyReply;
}

/// Calls the webhook forwarders in-process
pub struct ForwarderBackend {
    contracts: Arc<WebhookForwarder>,
    research: Arc<WebhookForwarder>,
}

impl ForwarderBackend {
    pub fn new(contracts: Arc<WebhookForwarder>, research: Arc<WebhookForwarder>) -> Self {
        Self { contracts, research }
    }
}

#[async_trait]
impl SearchBackend for ForwarderBackend {
    async fn contracts(&self, query: &UpstreamQuery) -> ProxyReply {
        self.contracts.forward(&query.to_json()).await
    }

    async fn research(&self, query: &UpstreamQuery) -> ProxyReply {
        self.research.forward(&query.to_json()).await
    }
}

/// Calls a running gateway's proxy routes over HTTP
#[derive(Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Create a backend for the gateway at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Send `token` as the session bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Exchange the shared password for a session token and keep it
    pub async fn login(self, password: &str) -> Result<Self, reqwest::Error> {
        let session: IssuedSession = self
            .client
            .post(format!("{}/api/session", self.base_url))
            .json(&serde_json::json!({ "password": password }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(scopes = ?session.scopes, expires_at = %session.expires_at, "Signed in to gateway");
        Ok(self.with_token(session.token))
    }

    async fn call(&self, kind: UpstreamKind, query: &UpstreamQuery) -> ProxyReply {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, kind.route()))
            .json(&query.to_json());

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        match self.read(request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(upstream = kind.as_str(), error = %e, "Proxy route request failed");
                ProxyReply::internal()
            }
        }
    }

    async fn read(&self, request: reqwest::RequestBuilder) -> Result<ProxyReply, reqwest::Error> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        // The proxy routes always answer JSON; anything else is a gateway fault
        let body = serde_json::from_str::<Value>(&text)
            .unwrap_or_else(|_| serde_json::json!({ "error": text }));

        Ok(ProxyReply { status, body })
    }
}

#[async_trait]
impl SearchBackend for HttpBackend {
    async fn contracts(&self, query: &UpstreamQuery) -> ProxyReply {
        self.call(UpstreamKind::Contracts, query).await
    }

    async fn research(&self, query: &UpstreamQuery) -> ProxyReply {
        self.call(UpstreamKind::Research, query).await
    }
}
