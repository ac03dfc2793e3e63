//! Mock AI providers for integration testing
//!
//! Provides wiremock-based servers that speak the OpenAI chat completions and
//! Anthropic messages wire formats.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock OpenAI API server
pub struct MockOpenAI {
    pub server: MockServer,
}

impl MockOpenAI {
    /// Create a new mock OpenAI server
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to configure as the provider endpoint
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Number of requests received so far
    pub async fn calls(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }

    /// Answer every chat completion with `content`
    pub async fn mock_completion(&self, content: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-openai-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_response(content)))
            .mount(&self.server)
            .await;
    }

    /// Answer the next `times` requests with a server error
    pub async fn mock_server_error(&self, times: u64) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": { "type": "server_error", "message": "Internal server error" }
            })))
            .up_to_n_times(times)
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Answer every request after `delay`
    pub async fn mock_slow_completion(&self, content: &str, delay: Duration) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(openai_response(content))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }
}

/// Mock Anthropic API server
pub struct MockAnthropic {
    pub server: MockServer,
}

impl MockAnthropic {
    /// Create a new mock Anthropic server
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to configure as the provider endpoint
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Number of requests received so far
    pub async fn calls(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }

    /// Answer every message request with `text`
    pub async fn mock_completion(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "test-anthropic-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_response(text)))
            .mount(&self.server)
            .await;
    }

    /// Answer every request with an overloaded error
    pub async fn mock_overloaded(&self) {
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_json(json!({
                "type": "error",
                "error": { "type": "overloaded_error", "message": "Overloaded" }
            })))
            .mount(&self.server)
            .await;
    }
}

/// OpenAI chat completion body
pub fn openai_response(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    })
}

/// Anthropic messages body
pub fn anthropic_response(text: &str) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-5-haiku-20241022",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn",
        "usage": { "input_tokens": 10, "output_tokens": 5 }
    })
}
