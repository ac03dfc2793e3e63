//! Prometheus metrics.

use failover_core::{AttemptRecord, CompletionOutcome};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};

/// `source` label value for answers produced locally
pub const LOCAL_FALLBACK_SOURCE: &str = "local_fallback";

/// Gateway metrics over a private registry
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    provider_attempts: IntCounterVec,
    attempt_duration: HistogramVec,
    responses: IntCounterVec,
    quota_denials: IntCounter,
    provider_available: IntGaugeVec,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create and register every metric
    ///
    /// # Errors
    /// Returns error if a metric cannot be created or registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let provider_attempts = IntCounterVec::new(
            Opts::new(
                "failover_provider_attempts_total",
                "Provider attempts by outcome",
            ),
            &["provider", "outcome"],
        )?;

        let attempt_duration = HistogramVec::new(
            HistogramOpts::new(
                "failover_provider_attempt_duration_seconds",
                "Provider attempt latency",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
            &["provider"],
        )?;

        let responses = IntCounterVec::new(
            Opts::new("failover_responses_total", "Answers by serving source"),
            &["source"],
        )?;

        let quota_denials = IntCounter::with_opts(Opts::new(
            "failover_quota_denials_total",
            "Requests denied by the quota gate",
        ))?;

        let provider_available = IntGaugeVec::new(
            Opts::new(
                "failover_provider_available",
                "Whether the provider is currently eligible (1) or cooling down (0)",
            ),
            &["provider"],
        )?;

        registry.register(Box::new(provider_attempts.clone()))?;
        registry.register(Box::new(attempt_duration.clone()))?;
        registry.register(Box::new(responses.clone()))?;
        registry.register(Box::new(quota_denials.clone()))?;
        registry.register(Box::new(provider_available.clone()))?;

        Ok(Self {
            registry,
            provider_attempts,
            attempt_duration,
            responses,
            quota_denials,
            provider_available,
        })
    }

    /// Record one provider attempt
    pub fn record_attempt(&self, attempt: &AttemptRecord) {
        self.provider_attempts
            .with_label_values(&[attempt.provider.as_str(), attempt.outcome.label()])
            .inc();
        self.attempt_duration
            .with_label_values(&[attempt.provider.as_str()])
            .observe(attempt.latency.as_secs_f64());
    }

    /// Record everything a finished request produced
    pub fn record_outcome(&self, outcome: &CompletionOutcome) {
        match outcome {
            CompletionOutcome::Completed(response) => {
                for attempt in &response.attempts {
                    self.record_attempt(attempt);
                }
                let source = response
                    .provider
                    .as_deref()
                    .unwrap_or(LOCAL_FALLBACK_SOURCE);
                self.responses.with_label_values(&[source]).inc();
            }
            CompletionOutcome::QuotaExceeded { .. } => self.quota_denials.inc(),
        }
    }

    /// Publish a provider's availability
    pub fn set_provider_available(&self, provider: &str, available: bool) {
        self.provider_available
            .with_label_values(&[provider])
            .set(i64::from(available));
    }

    /// Encode every metric in the Prometheus text format
    ///
    /// # Errors
    /// Returns error if encoding fails
    pub fn gather(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }
}

/// Metrics error
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Prometheus rejected a metric
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    /// Output was not valid UTF-8
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}
