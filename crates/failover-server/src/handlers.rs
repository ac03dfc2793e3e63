//! HTTP request handlers for the gateway API.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use failover_core::{
    CompletionOutcome, CompletionRequest, ErrorKind, GatewayError, SimulatedFault,
};
use failover_resilience::{CircuitState, HealthSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

use crate::{
    error::ApiError,
    extractors::{JsonBody, RequestId, UserId},
    state::AppState,
};

/// `active_provider` value when nothing is available
pub const LOCAL_FALLBACK: &str = "local_fallback";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics_endpoint(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    publish_availability(&state, &state.tracker.snapshot());
    let metrics = state
        .metrics
        .gather()
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics,
    ))
}

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// User message
    #[serde(default)]
    pub message: String,
    /// Technique hint
    #[serde(default)]
    pub technique: Option<String>,
    /// Failure to simulate on the first provider attempted
    #[serde(default)]
    pub simulate_error: Option<SimulatedFault>,
}

/// Chat answer
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Always true
    pub success: bool,
    /// Answer text
    pub message: String,
    /// Serving provider, absent for a local fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Technique annotation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technique: Option<String>,
    /// Mood annotation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    /// Upstream model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Whether anything other than the primary provider answered
    pub is_fallback: bool,
}

/// Chat completion with failover
#[instrument(skip_all, fields(request_id = %request_id, user = %user_id))]
pub async fn chat(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    UserId(user_id): UserId,
    JsonBody(body): JsonBody<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let simulate_error = match body.simulate_error {
        Some(fault) if state.injector.is_none() => {
            debug!(fault = ?fault, "Fault injection disabled, ignoring simulate_error");
            None
        }
        other => other,
    };

    let request = CompletionRequest {
        id: request_id,
        message: body.message,
        technique: body.technique.filter(|t| !t.trim().is_empty()),
        simulate_error,
        user_id,
    };
    request.validate()?;

    let outcome = state.orchestrator.complete(&request).await;
    state.metrics.record_outcome(&outcome);

    match outcome {
        CompletionOutcome::QuotaExceeded { message } => {
            Err(GatewayError::QuotaExceeded { message }.into())
        }
        CompletionOutcome::Completed(response) => Ok(Json(ChatResponse {
            success: true,
            message: response.message,
            provider: response.provider,
            technique: response.technique,
            mood: response.mood,
            model: response.model,
            is_fallback: response.is_fallback,
        })),
    }
}

/// Status of one provider
#[derive(Debug, Serialize)]
pub struct ProviderStatus {
    /// Whether the provider may be called
    pub available: bool,
    /// Routing priority, lower first
    pub priority: i32,
    /// Consecutive failures since the last success
    pub failure_count: u32,
    /// Cooldown in seconds
    pub cooldown_period: u64,
    /// Failure threshold
    pub max_failures: u32,
    /// Derived breaker state
    pub state: CircuitState,
    /// Adapter kind
    pub kind: String,
    /// Latest failure time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Latest failure classification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<ErrorKind>,
}

/// Provider status listing
#[derive(Debug, Serialize)]
pub struct ProviderStatusResponse {
    /// Always true
    pub success: bool,
    /// Provider the next request would try first
    pub active_provider: String,
    /// Status by provider name
    pub providers: BTreeMap<String, ProviderStatus>,
}

/// Current health of every provider
#[instrument(skip(state))]
pub async fn provider_status(State(state): State<AppState>) -> Json<ProviderStatusResponse> {
    let snapshot = state.tracker.snapshot();
    publish_availability(&state, &snapshot);

    let active_provider = snapshot
        .active_provider()
        .map_or_else(|| LOCAL_FALLBACK.to_string(), |p| p.name.clone());

    let providers = snapshot
        .providers
        .into_iter()
        .map(|p| {
            (
                p.name,
                ProviderStatus {
                    available: p.available,
                    priority: p.priority,
                    failure_count: p.failure_count,
                    cooldown_period: p.cooldown_period.as_secs(),
                    max_failures: p.max_failures,
                    state: p.state,
                    kind: p.kind,
                    last_failure_at: p.last_failure_at,
                    last_error: p.last_error,
                },
            )
        })
        .collect();

    Json(ProviderStatusResponse {
        success: true,
        active_provider,
        providers,
    })
}

/// Acknowledgement with a message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Always true
    pub success: bool,
    /// What happened
    pub message: String,
}

/// Reset every provider to healthy and drop pending failure directives
#[instrument(skip(state))]
pub async fn reset_providers(State(state): State<AppState>) -> Json<MessageResponse> {
    state.tracker.reset_all();
    if let Some(injector) = &state.injector {
        injector.clear();
    }

    Json(MessageResponse {
        success: true,
        message: "All providers have been reset".to_string(),
    })
}

/// Failure simulation request body
#[derive(Debug, Deserialize)]
pub struct SimulateFailureRequest {
    /// Provider to fail
    pub provider: String,
    /// Failure kind
    pub error_type: SimulatedFault,
}

/// Make the next attempt on a provider fail
#[instrument(skip_all, fields(provider = %body.provider))]
pub async fn simulate_provider_failure(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SimulateFailureRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let injector = state
        .injector
        .as_ref()
        .ok_or_else(|| ApiError::forbidden("Fault injection is disabled"))?;

    if !state.tracker.contains(&body.provider) {
        return Err(GatewayError::ProviderNotFound(body.provider).into());
    }

    // An open breaker skips the provider, so the directive would linger
    // until the cooldown ends and hit an unrelated request
    if !state.tracker.is_available(&body.provider) {
        return Err(ApiError::conflict(format!(
            "Provider {} is cooling down; reset providers before simulating a failure",
            body.provider
        )));
    }

    injector.arm(body.provider.clone(), body.error_type);
    info!(fault = ?body.error_type, "Provider failure armed");

    Ok(Json(MessageResponse {
        success: true,
        message: format!(
            "Next request to {} will fail with {}",
            body.provider,
            ErrorKind::from(body.error_type)
        ),
    }))
}

fn publish_availability(state: &AppState, snapshot: &HealthSnapshot) {
    for provider in &snapshot.providers {
        state
            .metrics
            .set_provider_available(&provider.name, provider.available);
    }
}
