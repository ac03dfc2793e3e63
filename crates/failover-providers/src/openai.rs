//! OpenAI provider adapter.
//!
//! Speaks the Chat Completions API, which also covers most OpenAI-compatible
//! servers (vLLM, Ollama, Together). A technique hint is sent as a system
//! message ahead of the user message.

use crate::http::{build_client, classify, status_error, technique_instruction};
use async_trait::async_trait;
use failover_core::{GatewayError, ProviderAdapter, ProviderCall, ProviderError, ProviderReply};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Public API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI adapter configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Provider name, used in error messages
    pub id: String,
    /// API key
    pub api_key: SecretString,
    /// Base URL, without `/chat/completions`
    pub base_url: String,
    /// Model to request
    pub model: String,
    /// HTTP deadline
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Configuration against the public API
    #[must_use]
    pub fn new(id: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            id: id.into(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gpt-4o-mini".to_string(),
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

/// Chat Completions adapter
pub struct OpenAiAdapter {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiAdapter {
    /// Create the adapter
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: OpenAiConfig) -> Result<Self, GatewayError> {
        let client = build_client(config.timeout)?;
        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn transform_request(&self, call: &ProviderCall<'_>) -> ChatRequest<'_> {
        let mut messages = Vec::with_capacity(2);
        if let Some(technique) = call.technique {
            messages.push(ChatMessage {
                role: "system",
                content: technique_instruction(technique),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: call.message.to_string(),
        });

        ChatRequest {
            model: &self.config.model,
            messages,
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> &str {
        "openai"
    }

    async fn invoke(&self, call: ProviderCall<'_>) -> Result<ProviderReply, ProviderError> {
        let url = self.completions_url();
        debug!(
            provider = %self.config.id,
            model = %self.config.model,
            request_id = %call.request_id,
            "Sending request to OpenAI"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&self.transform_request(&call))
            .send()
            .await
            .map_err(|e| classify(&e))?;

        if !response.status().is_success() {
            return Err(status_error(&self.config.id, response).await);
        }

        let body: ChatResponse = response.json().await.map_err(|e| classify(&e))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::response("OpenAI returned no message content"))?;

        let mut reply = ProviderReply::text(content);
        reply.model = body.model.or_else(|| Some(self.config.model.clone()));
        reply.technique = call.technique.map(ToString::to_string);
        Ok(reply)
    }
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use failover_core::{CompletionRequest, ErrorKind};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> OpenAiAdapter {
        let config = OpenAiConfig::new("openai", SecretString::new("sk-test".to_string()))
            .with_base_url(format!("{}/v1", server.uri()))
            .with_timeout(Duration::from_millis(500));
        OpenAiAdapter::new(config).unwrap()
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "messages": [{ "role": "user", "content": "hello" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hi there")))
            .expect(1)
            .mount(&server)
            .await;

        let request = CompletionRequest::new("hello");
        let reply = adapter(&server)
            .invoke(request.call_for_attempt(0))
            .await
            .unwrap();

        assert_eq!(reply.message, "Hi there");
        assert_eq!(reply.model.as_deref(), Some("gpt-4o-mini-2024-07-18"));
        assert!(reply.technique.is_none());
    }

    #[tokio::test]
    async fn test_technique_sent_as_system_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "messages": [
                    { "role": "system", "content": "Answer using the socratic technique." },
                    { "role": "user", "content": "why?" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Why do you ask?")))
            .expect(1)
            .mount(&server)
            .await;

        let request = CompletionRequest::builder()
            .message("why?")
            .technique("socratic")
            .build();
        let reply = adapter(&server)
            .invoke(request.call_for_attempt(0))
            .await
            .unwrap();
        assert_eq!(reply.technique.as_deref(), Some("socratic"));
    }

    #[tokio::test]
    async fn test_server_error_is_response_kind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let request = CompletionRequest::new("hello");
        let err = adapter(&server)
            .invoke(request.call_for_attempt(0))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Response);
        assert_eq!(err.status_code, Some(503));
        assert!(err.message.contains("overloaded"));
    }

    #[tokio::test]
    async fn test_empty_content_is_response_kind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("   ")))
            .mount(&server)
            .await;

        let request = CompletionRequest::new("hello");
        let err = adapter(&server)
            .invoke(request.call_for_attempt(0))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Response);
    }

    #[tokio::test]
    async fn test_malformed_body_is_response_kind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let request = CompletionRequest::new("hello");
        let err = adapter(&server)
            .invoke(request.call_for_attempt(0))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Response);
    }

    #[tokio::test]
    async fn test_slow_upstream_is_timeout_kind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let request = CompletionRequest::new("hello");
        let err = adapter(&server)
            .invoke(request.call_for_attempt(0))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_connection_kind() {
        let config = OpenAiConfig::new("openai", SecretString::new("sk".to_string()))
            .with_base_url("http://127.0.0.1:1/v1")
            .with_timeout(Duration::from_secs(2));
        let adapter = OpenAiAdapter::new(config).unwrap();

        let request = CompletionRequest::new("hello");
        let err = adapter
            .invoke(request.call_for_attempt(0))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Connection);
    }

    #[test]
    fn test_config_builder() {
        let config = OpenAiConfig::new("local", SecretString::new("k".to_string()))
            .with_base_url("http://localhost:8000/v1/")
            .with_model("llama3");
        assert_eq!(config.base_url, "http://localhost:8000/v1");
        assert_eq!(config.model, "llama3");
    }
}
