//! Provider abstraction.
//!
//! Every upstream AI backend implements [`ProviderAdapter`]. A
//! [`ProviderDescriptor`] binds an adapter to its routing and breaker settings.

use crate::error::{GatewayError, ProviderError};
use crate::request::ProviderCall;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default consecutive-failure threshold
pub const DEFAULT_MAX_FAILURES: u32 = 3;

/// Default cooldown after the breaker trips
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Default per-attempt timeout
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Successful answer from a provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderReply {
    /// Generated message text
    pub message: String,
    /// Model that produced the answer
    pub model: Option<String>,
    /// Technique annotation reported by the provider
    pub technique: Option<String>,
    /// Mood annotation reported by the provider
    pub mood: Option<String>,
}

impl ProviderReply {
    /// Create a reply with only message text
    #[must_use]
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Set the model identifier
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the mood annotation
    #[must_use]
    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }
}

/// Capability implemented once per upstream provider
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Short label for the upstream kind (e.g. "openai")
    fn kind(&self) -> &str;

    /// Send one completion attempt upstream
    async fn invoke(&self, call: ProviderCall<'_>) -> Result<ProviderReply, ProviderError>;
}

/// Immutable per-provider configuration
#[derive(Clone)]
pub struct ProviderDescriptor {
    name: String,
    priority: i32,
    max_failures: u32,
    cooldown_period: Duration,
    timeout: Duration,
    adapter: Arc<dyn ProviderAdapter>,
}

impl ProviderDescriptor {
    /// Create a descriptor with default threshold, cooldown and timeout
    #[must_use]
    pub fn new(name: impl Into<String>, priority: i32, adapter: Arc<dyn ProviderAdapter>) -> Self {
        Self {
            name: name.into(),
            priority,
            max_failures: DEFAULT_MAX_FAILURES,
            cooldown_period: DEFAULT_COOLDOWN,
            timeout: DEFAULT_ATTEMPT_TIMEOUT,
            adapter,
        }
    }

    /// Set the failure threshold
    #[must_use]
    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    /// Set the cooldown period
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown_period = cooldown;
        self
    }

    /// Set the per-attempt timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the adapter, keeping every other setting
    #[must_use]
    pub fn map_adapter(
        mut self,
        wrap: impl FnOnce(Arc<dyn ProviderAdapter>) -> Arc<dyn ProviderAdapter>,
    ) -> Self {
        self.adapter = wrap(self.adapter);
        self
    }

    /// Check the descriptor's invariants
    ///
    /// # Errors
    /// Returns error if the name is blank or the threshold is zero
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.name.trim().is_empty() {
            return Err(GatewayError::configuration("provider name cannot be empty"));
        }
        if self.max_failures == 0 {
            return Err(GatewayError::configuration(format!(
                "provider {} must have max_failures >= 1",
                self.name
            )));
        }
        if self.timeout.is_zero() {
            return Err(GatewayError::configuration(format!(
                "provider {} must have a non-zero timeout",
                self.name
            )));
        }
        Ok(())
    }

    /// Provider name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Routing priority (lower is tried first)
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Consecutive failures that trip the breaker
    #[must_use]
    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }

    /// How long a tripped provider is skipped
    #[must_use]
    pub fn cooldown_period(&self) -> Duration {
        self.cooldown_period
    }

    /// Per-attempt timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The adapter
    #[must_use]
    pub fn adapter(&self) -> &Arc<dyn ProviderAdapter> {
        &self.adapter
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("max_failures", &self.max_failures)
            .field("cooldown_period", &self.cooldown_period)
            .field("timeout", &self.timeout)
            .field("adapter", &self.adapter.kind())
            .finish()
    }
}
