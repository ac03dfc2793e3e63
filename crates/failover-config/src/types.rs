//! Configuration types.

use crate::error::ConfigError;
use failover_core::provider::{DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_COOLDOWN, DEFAULT_MAX_FAILURES};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use validator::Validate;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP listener
    #[validate(nested)]
    pub server: ServerConfig,
    /// Upstream providers in registration order
    #[validate(nested)]
    pub providers: Vec<ProviderConfig>,
    /// Per-user request limit
    pub quota: QuotaConfig,
    /// Failure simulation endpoints and directives
    pub fault_injection: FaultInjectionConfig,
    /// Local fallback answers and history
    pub fallback: FallbackConfig,
    /// Log output
    pub logging: LoggingSettings,
}

impl GatewayConfig {
    /// Field validation plus cross-field checks
    ///
    /// # Errors
    /// Returns the first problem found
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()?;

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if !seen.insert(provider.name.as_str()) {
                return Err(ConfigError::validation(format!(
                    "duplicate provider name '{}'",
                    provider.name
                )));
            }
            if provider.timeout.is_zero() {
                return Err(ConfigError::validation(format!(
                    "provider '{}' has a zero timeout",
                    provider.name
                )));
            }
        }

        if self.quota.window.is_zero() {
            return Err(ConfigError::validation("quota window must be non-zero"));
        }

        Ok(())
    }

    /// Providers that should be registered
    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled)
    }

    /// Mutable access to a provider by name
    pub fn provider_mut(&mut self, name: &str) -> Option<&mut ProviderConfig> {
        self.providers.iter_mut().find(|p| p.name == name)
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    #[validate(length(min = 1))]
    pub host: String,
    /// Bind port
    #[validate(range(min = 1))]
    pub port: u16,
    /// Upper bound on a whole request, including every provider attempt
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(300),
        }
    }
}

/// Upstream API flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI Chat Completions compatible
    #[serde(alias = "open_ai")]
    OpenAi,
    /// Anthropic Messages API
    Anthropic,
}

impl ProviderKind {
    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Public API endpoint
    #[must_use]
    pub const fn default_endpoint(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    /// Model used when none is configured
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-latest",
        }
    }

    /// Conventional API key variable
    #[must_use]
    pub const fn default_api_key_env(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// One upstream provider
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProviderConfig {
    /// Unique name, used in status output and failure simulation
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// API flavour
    pub kind: ProviderKind,
    /// Lower is tried first
    #[serde(default)]
    pub priority: i32,
    /// Consecutive failures before the breaker trips
    #[serde(default = "default_max_failures")]
    #[validate(range(min = 1))]
    pub max_failures: u32,
    /// How long a tripped provider is skipped
    #[serde(default = "default_cooldown", with = "humantime_serde")]
    pub cooldown_period: Duration,
    /// Per-attempt deadline
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Base URL, defaults to the public API for `kind`
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Model identifier, defaults per `kind`
    #[serde(default)]
    pub model: Option<String>,
    /// Inline API key
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Variable holding the API key, defaults per `kind`
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Whether the provider is registered at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ProviderConfig {
    /// Provider with defaults for `kind`
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ProviderKind, priority: i32) -> Self {
        Self {
            name: name.into(),
            kind,
            priority,
            max_failures: DEFAULT_MAX_FAILURES,
            cooldown_period: DEFAULT_COOLDOWN,
            timeout: DEFAULT_ATTEMPT_TIMEOUT,
            endpoint: None,
            model: None,
            api_key: None,
            api_key_env: None,
            enabled: true,
        }
    }

    /// Set the endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set an inline API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(key.into()));
        self
    }

    /// Set breaker parameters
    #[must_use]
    pub fn with_breaker(mut self, max_failures: u32, cooldown_period: Duration) -> Self {
        self.max_failures = max_failures;
        self.cooldown_period = cooldown_period;
        self
    }

    /// Set the per-attempt deadline
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Effective base URL without a trailing slash
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.kind.default_endpoint())
            .trim_end_matches('/')
    }

    /// Effective model
    #[must_use]
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.kind.default_model())
    }

    /// Effective API key variable
    #[must_use]
    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.kind.default_api_key_env())
    }

    /// Inline key, else the value of the key variable looked up through `env`
    pub fn resolve_api_key(&self, env: impl Fn(&str) -> Option<String>) -> Option<SecretString> {
        self.api_key.clone().or_else(|| {
            env(self.api_key_env())
                .filter(|value| !value.trim().is_empty())
                .map(SecretString::new)
        })
    }

    /// The two providers registered when none are configured
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("openai", ProviderKind::OpenAi, 1),
            Self::new("anthropic", ProviderKind::Anthropic, 2),
        ]
    }
}

/// Per-user request limit
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Requests per window; unlimited when absent
    pub limit: Option<u32>,
    /// Window length
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Message shown on denial
    pub message: Option<String>,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            limit: None,
            window: Duration::from_secs(24 * 60 * 60),
            message: None,
        }
    }
}

/// Failure simulation
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct FaultInjectionConfig {
    /// Honour `simulate_error` and `/simulate-provider-failure`
    pub enabled: bool,
}

/// Local fallback answers and conversation history
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Canned answers; built-in set when empty
    pub messages: Vec<String>,
    /// Conversation turns kept in memory
    pub history_capacity: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            history_capacity: 1000,
        }
    }
}

/// Log output
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `failover_routing=debug`
    pub level: String,
    /// `pretty`, `json` or `compact`
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

fn default_max_failures() -> u32 {
    DEFAULT_MAX_FAILURES
}

fn default_cooldown() -> Duration {
    DEFAULT_COOLDOWN
}

fn default_timeout() -> Duration {
    DEFAULT_ATTEMPT_TIMEOUT
}

fn default_enabled() -> bool {
    true
}
