//! Failover flows against mock upstreams

use crate::helpers::*;
use crate::mock_providers::*;
use serde_json::json;
use std::time::Duration;

async fn upstreams() -> (MockOpenAI, MockAnthropic) {
    let openai = MockOpenAI::new().await;
    let anthropic = MockAnthropic::new().await;
    anthropic.mock_completion("Hello from Anthropic").await;
    (openai, anthropic)
}

#[tokio::test]
async fn test_primary_serves_when_healthy() {
    let (openai, anthropic) = upstreams().await;
    openai.mock_completion("Hello from OpenAI").await;
    let server = TestServer::start(&two_provider_config(&openai.url(), &anthropic.url())).await;

    let body = server.chat("Hi").await;

    assert_eq!(body["success"], true);
    assert_eq!(body["provider"], "openai");
    assert_eq!(body["message"], "Hello from OpenAI");
    assert_eq!(body["model"], "gpt-4o-mini-2024-07-18");
    assert_eq!(body["is_fallback"], false);
    assert_eq!(anthropic.calls().await, 0);
}

#[tokio::test]
async fn test_failover_after_upstream_errors() {
    let (openai, anthropic) = upstreams().await;
    openai.mock_completion("Hello from OpenAI").await;
    openai.mock_server_error(2).await;
    let server = TestServer::start(&two_provider_config(&openai.url(), &anthropic.url())).await;

    for _ in 0..2 {
        let body = server.chat("Hi").await;
        assert_eq!(body["provider"], "anthropic");
        assert_eq!(body["message"], "Hello from Anthropic");
        assert_eq!(body["is_fallback"], true);
    }

    let status = server.provider_status().await;
    assert_eq!(status["providers"]["openai"]["failure_count"], 2);
    assert_eq!(status["providers"]["openai"]["available"], true);
    assert_eq!(status["providers"]["openai"]["last_error"], "response");

    // A success clears the failure count
    let body = server.chat("Hi again").await;
    assert_eq!(body["provider"], "openai");
    let status = server.provider_status().await;
    assert_eq!(status["providers"]["openai"]["failure_count"], 0);
}

#[tokio::test]
async fn test_breaker_trips_and_reset_restores() {
    let (openai, anthropic) = upstreams().await;
    openai.mock_completion("Hello from OpenAI").await;
    openai.mock_server_error(3).await;
    let server = TestServer::start(&two_provider_config(&openai.url(), &anthropic.url())).await;

    for _ in 0..3 {
        server.chat("Hi").await;
    }
    let status = server.provider_status().await;
    assert_eq!(status["providers"]["openai"]["available"], false);
    assert_eq!(status["providers"]["openai"]["state"], "open");
    assert_eq!(status["active_provider"], "anthropic");

    // Tripped provider is skipped without contacting the upstream
    let body = server.chat("Skip").await;
    assert_eq!(body["provider"], "anthropic");
    assert_eq!(openai.calls().await, 3);

    let response = server.post_json("/reset-providers", &json!({})).await;
    assert_status(&response, 200);

    let status = server.provider_status().await;
    assert_eq!(status["providers"]["openai"]["failure_count"], 0);
    assert_eq!(status["providers"]["openai"]["available"], true);

    let body = server.chat("Back").await;
    assert_eq!(body["provider"], "openai");
}

#[tokio::test]
async fn test_slow_primary_times_out() {
    let (openai, anthropic) = upstreams().await;
    openai
        .mock_slow_completion("Too late", Duration::from_secs(3))
        .await;
    let server = TestServer::start(&two_provider_config(&openai.url(), &anthropic.url())).await;

    let body = server.chat("Hi").await;

    assert_eq!(body["provider"], "anthropic");
    let status = server.provider_status().await;
    assert_eq!(status["providers"]["openai"]["failure_count"], 1);
    assert_eq!(status["providers"]["openai"]["last_error"], "timeout");
}

#[tokio::test]
async fn test_simulated_failure_fails_over_once() {
    let (openai, anthropic) = upstreams().await;
    openai.mock_completion("Hello from OpenAI").await;
    let server = TestServer::start(&two_provider_config(&openai.url(), &anthropic.url())).await;

    let response = server.simulate_failure("openai", "timeout").await;
    assert_status(&response, 200);

    let body = server.chat("Hi").await;
    assert_eq!(body["provider"], "anthropic");
    assert_eq!(openai.calls().await, 0);

    let status = server.provider_status().await;
    assert_eq!(status["providers"]["openai"]["failure_count"], 1);
    assert_eq!(status["providers"]["openai"]["last_error"], "timeout");

    let body = server.chat("Hi").await;
    assert_eq!(body["provider"], "openai");
}

#[tokio::test]
async fn test_all_providers_down_uses_local_fallback() {
    let openai = MockOpenAI::new().await;
    let anthropic = MockAnthropic::new().await;
    openai.mock_server_error(u64::MAX).await;
    anthropic.mock_overloaded().await;
    let server = TestServer::start(&two_provider_config(&openai.url(), &anthropic.url())).await;

    for _ in 0..3 {
        let body = server.chat("Hi").await;
        assert_eq!(body["is_fallback"], true);
        assert!(body.get("provider").is_none());
    }

    let before = server.provider_status().await;
    assert_eq!(before["active_provider"], "local_fallback");
    let calls = (openai.calls().await, anthropic.calls().await);

    let body = server.chat("Anyone?").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["is_fallback"], true);
    assert!(body.get("provider").is_none());
    assert!(!body["message"].as_str().unwrap().is_empty());

    assert_eq!((openai.calls().await, anthropic.calls().await), calls);
    assert_eq!(server.provider_status().await, before);
}

#[tokio::test]
async fn test_quota_denies_before_providers() {
    let (openai, anthropic) = upstreams().await;
    openai.mock_completion("Hello from OpenAI").await;
    let mut config = two_provider_config(&openai.url(), &anthropic.url());
    config.quota.limit = Some(1);
    let server = TestServer::start(&config).await;
    let body = json!({ "message": "Hi" });

    let response = server
        .post_json_with_headers("/chat", &body, vec![("x-user-id", "alice")])
        .await;
    assert_status(&response, 200);

    let before = server.provider_status().await;
    let response = server
        .post_json_with_headers("/chat", &body, vec![("x-user-id", "alice")])
        .await;
    assert_status(&response, 429);
    let denied = TestServer::json_body(response).await;
    assert_eq!(denied["quota_exceeded"], true);
    assert_eq!(denied["success"], false);
    assert_eq!(openai.calls().await, 1);
    assert_eq!(server.provider_status().await, before);

    let response = server
        .post_json_with_headers("/chat", &body, vec![("x-user-id", "bob")])
        .await;
    assert_status(&response, 200);
}

#[tokio::test]
async fn test_keyless_deployment_answers_locally() {
    let mut config = two_provider_config("http://127.0.0.1:1", "http://127.0.0.1:1");
    for provider in &mut config.providers {
        provider.api_key = None;
    }
    let server = TestServer::start(&config).await;

    let body = server.chat("Hi").await;
    assert_eq!(body["is_fallback"], true);

    let status = server.provider_status().await;
    assert_eq!(status["active_provider"], "local_fallback");
    assert!(status["providers"].as_object().unwrap().is_empty());
}
