//! Test helper utilities for integration tests

use failover_config::{GatewayConfig, ProviderConfig, ProviderKind};
use failover_server::{AppState, Server, ServerConfig};
use once_cell::sync::Lazy;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Initialize tracing for tests (only once)
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
});

/// Initialize tracing for tests
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Gateway configuration with an OpenAI primary and an Anthropic secondary
/// pointed at the given upstreams
pub fn two_provider_config(openai_url: &str, anthropic_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig {
        providers: vec![
            ProviderConfig::new("openai", ProviderKind::OpenAi, 1)
                .with_endpoint(openai_url)
                .with_api_key("test-openai-key")
                .with_breaker(3, Duration::from_secs(60))
                .with_timeout(Duration::from_millis(500)),
            ProviderConfig::new("anthropic", ProviderKind::Anthropic, 2)
                .with_endpoint(anthropic_url)
                .with_api_key("test-anthropic-key")
                .with_breaker(3, Duration::from_secs(60))
                .with_timeout(Duration::from_millis(500)),
        ],
        ..Default::default()
    };
    config.fault_injection.enabled = true;
    config
}

/// Test server wrapper for integration tests
pub struct TestServer {
    /// The server address
    pub addr: SocketAddr,
    /// HTTP client for making requests
    pub client: Client,
    /// Base URL for the server
    pub base_url: String,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a gateway built from `config`
    pub async fn start(config: &GatewayConfig) -> Self {
        init_tracing();
        let state = AppState::from_config(config, |_| None).expect("Failed to build state");
        Self::with_state(state).await
    }

    /// Start a gateway around prepared state
    pub async fn with_state(state: AppState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let server = Server::new(ServerConfig::default(), state);

        tokio::spawn(async move {
            server
                .serve(listener, async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create client");

        Self {
            addr,
            client,
            base_url: format!("http://{addr}"),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the full URL for a path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.post_json_with_headers(path, body, Vec::new()).await
    }

    /// Make a POST request with JSON body and headers
    pub async fn post_json_with_headers(
        &self,
        path: &str,
        body: &Value,
        headers: Vec<(&str, &str)>,
    ) -> Response {
        let mut builder = self.client.post(self.url(path)).json(body);
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder.send().await.expect("Request failed")
    }

    /// Send a chat message and return the parsed answer
    pub async fn chat(&self, message: &str) -> Value {
        let response = self.post_json("/chat", &json!({ "message": message })).await;
        assert_status(&response, 200);
        Self::json_body(response).await
    }

    /// Arm a one-shot failure on `provider`
    pub async fn simulate_failure(&self, provider: &str, error_type: &str) -> Response {
        self.post_json(
            "/simulate-provider-failure",
            &json!({ "provider": provider, "error_type": error_type }),
        )
        .await
    }

    /// Current provider status listing
    pub async fn provider_status(&self) -> Value {
        Self::json_body(self.get("/provider-status").await).await
    }

    /// Parse response body as JSON
    pub async fn json_body(response: Response) -> Value {
        response.json().await.expect("Failed to parse JSON")
    }

    /// Shutdown the test server
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Assert response status code
pub fn assert_status(response: &Response, expected: u16) {
    assert_eq!(
        response.status().as_u16(),
        expected,
        "Expected status {expected}, got {}",
        response.status()
    );
}
