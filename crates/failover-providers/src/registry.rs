//! Provider registration from configuration.
//!
//! Turns the configured provider list into descriptors ready for the health
//! tracker. Providers without an API key are skipped with a warning so a
//! partially configured deployment still starts.

use crate::anthropic::{AnthropicAdapter, AnthropicConfig};
use crate::openai::{OpenAiAdapter, OpenAiConfig};
use failover_config::{GatewayConfig, ProviderConfig, ProviderKind};
use failover_core::{GatewayResult, ProviderAdapter, ProviderDescriptor};
use failover_resilience::FailureInjector;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, warn};

/// Build the HTTP adapter for one provider
///
/// # Errors
/// Returns error if the HTTP client cannot be created
pub fn build_adapter(
    provider: &ProviderConfig,
    api_key: SecretString,
) -> GatewayResult<Arc<dyn ProviderAdapter>> {
    let adapter: Arc<dyn ProviderAdapter> = match provider.kind {
        ProviderKind::OpenAi => Arc::new(OpenAiAdapter::new(
            OpenAiConfig::new(&provider.name, api_key)
                .with_base_url(provider.endpoint())
                .with_model(provider.model())
                .with_timeout(provider.timeout),
        )?),
        ProviderKind::Anthropic => Arc::new(AnthropicAdapter::new(
            AnthropicConfig::new(&provider.name, api_key)
                .with_base_url(provider.endpoint())
                .with_model(provider.model())
                .with_timeout(provider.timeout),
        )?),
    };
    Ok(adapter)
}

/// Descriptor for one provider around an already built adapter
#[must_use]
pub fn describe(provider: &ProviderConfig, adapter: Arc<dyn ProviderAdapter>) -> ProviderDescriptor {
    ProviderDescriptor::new(&provider.name, provider.priority, adapter)
        .with_max_failures(provider.max_failures)
        .with_cooldown(provider.cooldown_period)
        .with_timeout(provider.timeout)
}

/// Builds descriptors for every enabled, keyed provider
pub struct ProviderRegistry<'a> {
    config: &'a GatewayConfig,
    injector: Option<Arc<FailureInjector>>,
}

impl<'a> ProviderRegistry<'a> {
    /// Registry over `config`
    #[must_use]
    pub fn new(config: &'a GatewayConfig) -> Self {
        Self {
            config,
            injector: None,
        }
    }

    /// Wrap every adapter in the fault-injection decorator
    #[must_use]
    pub fn with_injector(mut self, injector: Arc<FailureInjector>) -> Self {
        self.injector = Some(injector);
        self
    }

    /// Build descriptors in configuration order
    ///
    /// # Errors
    /// Returns error if an adapter cannot be created
    pub fn build(&self, env: impl Fn(&str) -> Option<String>) -> GatewayResult<Vec<ProviderDescriptor>> {
        let mut descriptors = Vec::new();

        for provider in self.config.enabled_providers() {
            let Some(api_key) = provider.resolve_api_key(&env) else {
                warn!(
                    provider = %provider.name,
                    env = %provider.api_key_env(),
                    "No API key configured, provider not registered"
                );
                continue;
            };

            let descriptor = describe(provider, build_adapter(provider, api_key)?);
            let descriptor = match &self.injector {
                Some(injector) => injector.instrument(descriptor),
                None => descriptor,
            };

            info!(
                provider = %provider.name,
                kind = %provider.kind.as_str(),
                priority = provider.priority,
                max_failures = provider.max_failures,
                cooldown_secs = provider.cooldown_period.as_secs(),
                "Registered provider"
            );
            descriptors.push(descriptor);
        }

        if descriptors.is_empty() {
            warn!("No providers registered, every request will use the local fallback");
        }

        Ok(descriptors)
    }
}
