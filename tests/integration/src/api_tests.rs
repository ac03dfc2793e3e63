//! HTTP surface tests

use crate::helpers::*;
use crate::mock_providers::*;
use serde_json::json;

async fn server() -> (TestServer, MockOpenAI, MockAnthropic) {
    let openai = MockOpenAI::new().await;
    let anthropic = MockAnthropic::new().await;
    openai.mock_completion("Hello from OpenAI").await;
    anthropic.mock_completion("Hello from Anthropic").await;
    let server = TestServer::start(&two_provider_config(&openai.url(), &anthropic.url())).await;
    (server, openai, anthropic)
}

#[tokio::test]
async fn test_health() {
    let (server, _openai, _anthropic) = server().await;

    let response = server.get("/health").await;
    assert_status(&response, 200);

    let body = TestServer::json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_request_id_is_returned() {
    let (server, _openai, _anthropic) = server().await;

    let response = server.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));

    let response = server
        .post_json_with_headers(
            "/chat",
            &json!({ "message": "Hi" }),
            vec![("x-request-id", "6f1c3a52-6c7e-4d5b-9f0e-2a8d3b4c5e6f")],
        )
        .await;
    assert_eq!(
        response.headers()["x-request-id"],
        "6f1c3a52-6c7e-4d5b-9f0e-2a8d3b4c5e6f"
    );
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let (server, openai, _anthropic) = server().await;

    let response = server.post_json("/chat", &json!({ "message": "" })).await;
    assert_status(&response, 400);
    let body = TestServer::json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(openai.calls().await, 0);
}

#[tokio::test]
async fn test_reset_accepts_get() {
    let (server, _openai, _anthropic) = server().await;

    let response = server.get("/reset-providers").await;
    assert_status(&response, 200);
    let body = TestServer::json_body(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_simulate_rejects_unknown_kind() {
    let (server, _openai, _anthropic) = server().await;

    let response = server.simulate_failure("openai", "meltdown").await;
    assert_status(&response, 400);
}

#[tokio::test]
async fn test_simulate_forbidden_when_disabled() {
    let openai = MockOpenAI::new().await;
    let anthropic = MockAnthropic::new().await;
    let mut config = two_provider_config(&openai.url(), &anthropic.url());
    config.fault_injection.enabled = false;
    let server = TestServer::start(&config).await;

    let response = server.simulate_failure("openai", "timeout").await;
    assert_status(&response, 403);
}

#[tokio::test]
async fn test_metrics_exposed() {
    let (server, _openai, _anthropic) = server().await;
    server.chat("Hi").await;

    let response = server.get("/metrics").await;
    assert_status(&response, 200);
    let text = response.text().await.unwrap();
    assert!(text.contains(r#"failover_responses_total{source="openai"} 1"#));
    assert!(text.contains("failover_provider_available"));
}
