//! Anthropic provider adapter.
//!
//! Speaks the Messages API. The technique hint travels in the top-level
//! `system` field; text blocks of the reply are concatenated.

use crate::http::{build_client, classify, status_error, technique_instruction};
use async_trait::async_trait;
use failover_core::{GatewayError, ProviderAdapter, ProviderCall, ProviderError, ProviderReply};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Public API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Value sent in the `anthropic-version` header
pub const API_VERSION: &str = "2023-06-01";

const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Anthropic adapter configuration
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// Provider name, used in error messages
    pub id: String,
    /// API key
    pub api_key: SecretString,
    /// Base URL, without `/messages`
    pub base_url: String,
    /// Model to request
    pub model: String,
    /// Output token cap
    pub max_tokens: u32,
    /// HTTP deadline
    pub timeout: Duration,
}

impl AnthropicConfig {
    /// Configuration against the public API
    #[must_use]
    pub fn new(id: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            id: id.into(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "claude-3-5-haiku-latest".to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the HTTP deadline
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Messages API adapter
pub struct AnthropicAdapter {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicAdapter {
    /// Create the adapter
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: AnthropicConfig) -> Result<Self, GatewayError> {
        let client = build_client(config.timeout)?;
        Ok(Self { config, client })
    }

    fn transform_request<'a>(&'a self, call: &ProviderCall<'a>) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: call.technique.map(technique_instruction),
            messages: vec![Message {
                role: "user",
                content: call.message,
            }],
        }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn kind(&self) -> &str {
        "anthropic"
    }

    async fn invoke(&self, call: ProviderCall<'_>) -> Result<ProviderReply, ProviderError> {
        debug!(
            provider = %self.config.id,
            model = %self.config.model,
            request_id = %call.request_id,
            "Sending request to Anthropic"
        );

        let response = self
            .client
            .post(format!("{}/messages", self.config.base_url))
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&self.transform_request(&call))
            .send()
            .await
            .map_err(|e| classify(&e))?;

        if !response.status().is_success() {
            return Err(status_error(&self.config.id, response).await);
        }

        let body: MessagesResponse = response.json().await.map_err(|e| classify(&e))?;

        let text: String = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(ProviderError::response("Anthropic returned no text content"));
        }

        let mut reply = ProviderReply::text(text);
        reply.model = body.model.or_else(|| Some(self.config.model.clone()));
        reply.technique = call.technique.map(ToString::to_string);
        Ok(reply)
    }
}

// ============================================================================
// Anthropic API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}
