//! Shared application state.

use failover_config::GatewayConfig;
use failover_core::{GatewayError, GatewayResult};
use failover_providers::ProviderRegistry;
use failover_resilience::{FailureInjector, HealthTracker};
use failover_routing::{
    FailoverOrchestrator, FixedWindowQuota, InMemoryHistory, LocalFallback, QuotaGate,
};
use failover_telemetry::Metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Provider health, shared with the orchestrator
    pub tracker: Arc<HealthTracker>,
    /// Request router
    pub orchestrator: Arc<FailoverOrchestrator>,
    /// Present only when fault injection is enabled
    pub injector: Option<Arc<FailureInjector>>,
    /// Prometheus metrics
    pub metrics: Metrics,
    /// Process start, for uptime
    pub started_at: Instant,
}

impl AppState {
    /// Start building state
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }

    /// Assemble state from configuration, resolving API keys through `env`
    ///
    /// # Errors
    /// Returns error if a provider cannot be built or registered
    pub fn from_config(
        config: &GatewayConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> GatewayResult<Self> {
        let injector = config
            .fault_injection
            .enabled
            .then(|| Arc::new(FailureInjector::new()));

        let mut registry = ProviderRegistry::new(config);
        if let Some(injector) = &injector {
            registry = registry.with_injector(Arc::clone(injector));
        }
        let tracker = Arc::new(HealthTracker::new(registry.build(env)?)?);

        let mut orchestrator = FailoverOrchestrator::new(tracker)
            .with_fallback(LocalFallback::new(config.fallback.messages.clone()))
            .with_history(Arc::new(InMemoryHistory::new(
                config.fallback.history_capacity,
            )));

        if let Some(limit) = config.quota.limit {
            let mut quota = FixedWindowQuota::new(limit, config.quota.window);
            if let Some(message) = &config.quota.message {
                quota = quota.with_message(message);
            }
            let quota: Arc<dyn QuotaGate> = Arc::new(quota);
            orchestrator = orchestrator.with_quota(quota);
            info!(limit, window_secs = config.quota.window.as_secs(), "Quota enabled");
        }

        if injector.is_some() {
            info!("Fault injection enabled");
        }

        let mut builder = Self::builder().orchestrator(orchestrator);
        if let Some(injector) = injector {
            builder = builder.injector(injector);
        }
        builder.build()
    }
}

/// Builder for [`AppState`]
#[derive(Default)]
pub struct AppStateBuilder {
    orchestrator: Option<FailoverOrchestrator>,
    injector: Option<Arc<FailureInjector>>,
    metrics: Option<Metrics>,
}

impl AppStateBuilder {
    /// Set the orchestrator; its tracker becomes the shared tracker
    #[must_use]
    pub fn orchestrator(mut self, orchestrator: FailoverOrchestrator) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    /// Enable the failure simulation endpoint with this injector
    #[must_use]
    pub fn injector(mut self, injector: Arc<FailureInjector>) -> Self {
        self.injector = Some(injector);
        self
    }

    /// Use these metrics instead of a fresh registry
    #[must_use]
    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the state
    ///
    /// Without an orchestrator every request is answered by the local fallback.
    ///
    /// # Errors
    /// Returns error if metrics cannot be registered
    pub fn build(self) -> GatewayResult<AppState> {
        let orchestrator = self
            .orchestrator
            .unwrap_or_else(|| FailoverOrchestrator::new(Arc::new(HealthTracker::empty())));
        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => Metrics::new().map_err(|e| GatewayError::internal(e.to_string()))?,
        };

        Ok(AppState {
            tracker: Arc::clone(orchestrator.tracker()),
            orchestrator: Arc::new(orchestrator),
            injector: self.injector,
            metrics,
            started_at: Instant::now(),
        })
    }
}
