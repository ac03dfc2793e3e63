//! Priority-ordered failover across providers.
//!
//! One request produces exactly one answer. Providers are attempted one at a
//! time in priority order, skipping those whose breaker is open. Every
//! attempt that resolves updates that provider's health exactly once. When
//! nothing answers, the caller still gets a locally synthesized fallback.
//!
//! Dropping the future returned by [`FailoverOrchestrator::complete`] cancels
//! the in-flight attempt; a cancelled attempt records no health outcome and
//! no further providers are tried.

use crate::fallback::LocalFallback;
use crate::history::{ConversationTurn, HistorySink, NoopHistory};
use crate::quota::{QuotaGate, UnlimitedQuota, DEFAULT_QUOTA_MESSAGE};
use chrono::Utc;
use failover_core::{
    AttemptOutcome, AttemptRecord, CompletionOutcome, CompletionRequest, CompletionResponse,
    ErrorKind,
};
use failover_resilience::{invoke_with_timeout, HealthTracker};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Routes completion requests across providers with failover
pub struct FailoverOrchestrator {
    tracker: Arc<HealthTracker>,
    quota: Arc<dyn QuotaGate>,
    fallback: LocalFallback,
    history: Arc<dyn HistorySink>,
}

impl FailoverOrchestrator {
    /// Create an orchestrator with no quota, default fallback messages and no history
    #[must_use]
    pub fn new(tracker: Arc<HealthTracker>) -> Self {
        Self {
            tracker,
            quota: Arc::new(UnlimitedQuota),
            fallback: LocalFallback::default(),
            history: Arc::new(NoopHistory),
        }
    }

    /// Set the quota gate
    #[must_use]
    pub fn with_quota(mut self, quota: Arc<dyn QuotaGate>) -> Self {
        self.quota = quota;
        self
    }

    /// Set the fallback responder
    #[must_use]
    pub fn with_fallback(mut self, fallback: LocalFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Set the history sink
    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn HistorySink>) -> Self {
        self.history = history;
        self
    }

    /// The shared health tracker
    #[must_use]
    pub fn tracker(&self) -> &Arc<HealthTracker> {
        &self.tracker
    }

    /// Answer one request
    #[instrument(skip_all, fields(request_id = %request.id, user = %request.user_id))]
    pub async fn complete(&self, request: &CompletionRequest) -> CompletionOutcome {
        let decision = self.quota.check(&request.user_id).await;
        if !decision.allowed {
            info!("Quota exceeded, no provider contacted");
            return CompletionOutcome::QuotaExceeded {
                message: decision
                    .message
                    .unwrap_or_else(|| DEFAULT_QUOTA_MESSAGE.to_string()),
            };
        }

        let candidates = self.tracker.ordered_available_providers();
        let primary = self.tracker.primary().map(|d| d.name().to_string());
        let mut attempts = Vec::with_capacity(candidates.len());

        debug!(
            candidates = ?candidates.iter().map(|d| d.name()).collect::<Vec<_>>(),
            "Routing completion request"
        );

        for (attempt, descriptor) in candidates.iter().enumerate() {
            let started = Instant::now();
            let result = invoke_with_timeout(descriptor, request.call_for_attempt(attempt)).await;
            let latency = started.elapsed();

            match result {
                Ok(reply) => {
                    self.tracker.record_success(descriptor.name());
                    attempts.push(AttemptRecord {
                        provider: descriptor.name().to_string(),
                        outcome: AttemptOutcome::Success,
                        latency,
                    });

                    let is_fallback = primary.as_deref() != Some(descriptor.name());
                    info!(
                        provider = %descriptor.name(),
                        attempt = attempt + 1,
                        is_fallback = is_fallback,
                        latency_ms = latency.as_millis(),
                        "Completion served"
                    );

                    let response = CompletionResponse {
                        message: reply.message,
                        provider: Some(descriptor.name().to_string()),
                        is_fallback,
                        technique: reply.technique.or_else(|| request.technique.clone()),
                        mood: reply.mood,
                        model: reply.model,
                        attempts,
                    };
                    self.remember(request, &response);
                    return CompletionOutcome::Completed(response);
                }
                Err(error) => {
                    let kind = if error.kind.is_provider_fault() {
                        error.kind
                    } else {
                        ErrorKind::Response
                    };
                    self.tracker.record_failure(descriptor.name(), kind);
                    attempts.push(AttemptRecord {
                        provider: descriptor.name().to_string(),
                        outcome: AttemptOutcome::Failure(kind),
                        latency,
                    });

                    warn!(
                        provider = %descriptor.name(),
                        attempt = attempt + 1,
                        kind = %kind,
                        status = ?error.status_code,
                        error = %error.message,
                        "Provider attempt failed, trying next"
                    );
                }
            }
        }

        warn!(
            attempted = attempts.len(),
            registered = self.tracker.len(),
            "No provider answered, using local fallback"
        );
        let response = self.fallback.respond(request, attempts);
        self.remember(request, &response);
        CompletionOutcome::Completed(response)
    }

    fn remember(&self, request: &CompletionRequest, response: &CompletionResponse) {
        self.history.record(ConversationTurn {
            request_id: request.id,
            user_id: request.user_id.clone(),
            message: request.message.clone(),
            reply: response.message.clone(),
            provider: response.provider.clone(),
            is_fallback: response.is_fallback,
            recorded_at: Utc::now(),
        });
    }
}
