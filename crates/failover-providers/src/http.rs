//! HTTP plumbing shared by the adapters.
//!
//! Transport failures are classified here so every adapter reports the same
//! `ErrorKind` for the same kind of fault.

use failover_core::{GatewayError, ProviderError};
use reqwest::{Client, Response};
use std::time::Duration;

const MAX_ERROR_BODY: usize = 512;

/// Build a client with the provider's deadline applied
pub(crate) fn build_client(timeout: Duration) -> Result<Client, GatewayError> {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(32)
        .build()
        .map_err(|e| GatewayError::internal(format!("Failed to create HTTP client: {e}")))
}

/// Classify an error from sending a request or reading its body
pub(crate) fn classify(error: &reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::timeout(format!("Request timed out: {error}"))
    } else if error.is_connect() || error.is_request() {
        ProviderError::connection(format!("Request failed: {error}"))
    } else if error.is_decode() || error.is_body() {
        ProviderError::response(format!("Failed to read response: {error}"))
    } else {
        ProviderError::connection(format!("Request failed: {error}"))
    }
}

/// Turn a non-2xx response into a `Response` error carrying the status
pub(crate) async fn status_error(provider: &str, response: Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ProviderError::response(format!(
        "{provider} returned {status}: {}",
        truncate(&body)
    ))
    .with_status(status.as_u16())
}

/// System instruction derived from a technique hint
pub(crate) fn technique_instruction(technique: &str) -> String {
    format!("Answer using the {technique} technique.")
}

fn truncate(body: &str) -> &str {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
