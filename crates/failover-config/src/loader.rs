//! Configuration loading.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. A YAML or TOML file (`FAILOVER_CONFIG`, else `config/gateway.yaml`, else `config/gateway.toml`)
//! 3. `FAILOVER_*` environment variables

use crate::error::ConfigError;
use crate::types::{GatewayConfig, ProviderConfig};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "FAILOVER_CONFIG";

/// Files probed when no path is given
pub const DEFAULT_CONFIG_PATHS: &[&str] = &["config/gateway.yaml", "config/gateway.toml"];

const PROVIDER_ENV_PREFIX: &str = "FAILOVER_PROVIDER_";

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// On-disk format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML
    Yaml,
    /// TOML
    Toml,
}

impl ConfigFormat {
    /// Format implied by a file extension
    ///
    /// # Errors
    /// Returns `UnsupportedFormat` for anything but `.yaml`, `.yml` and `.toml`
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Parse configuration text
///
/// # Errors
/// Returns `Parse` if the text is not valid for `format`
pub fn parse_config(
    content: &str,
    format: ConfigFormat,
    origin: &Path,
) -> Result<GatewayConfig, ConfigError> {
    let parsed = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    };

    parsed.map_err(|message| ConfigError::Parse {
        path: origin.to_path_buf(),
        message,
    })
}

/// Builds a [`GatewayConfig`] from file and environment
#[derive(Clone)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    env: EnvLookup,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ConfigLoader {
    /// Loader reading the process environment
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: None,
            env: Arc::new(|key| std::env::var(key).ok()),
        }
    }

    /// Read this file instead of probing
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Replace the environment lookup
    #[must_use]
    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(env);
        self
    }

    /// Look up a variable through the configured environment
    #[must_use]
    pub fn env_var(&self, key: &str) -> Option<String> {
        (self.env)(key)
    }

    /// Load, override and validate
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an override is
    /// malformed, or the result fails validation
    pub async fn load(&self) -> Result<GatewayConfig, ConfigError> {
        let mut config = match self.resolve_path().await {
            Some(path) => {
                let content = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| ConfigError::Io {
                        path: path.clone(),
                        source,
                    })?;
                let config = parse_config(&content, ConfigFormat::from_path(&path)?, &path)?;
                info!(path = %path.display(), "Loaded configuration file");
                config
            }
            None => {
                debug!("No configuration file found, using defaults");
                GatewayConfig::default()
            }
        };

        if config.providers.is_empty() {
            config.providers = ProviderConfig::defaults();
        }

        self.apply_env_overrides(&mut config)?;
        config.check()?;
        Ok(config)
    }

    async fn resolve_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.path {
            return Some(path.clone());
        }
        if let Some(path) = self.env_var(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        for candidate in DEFAULT_CONFIG_PATHS {
            if tokio::fs::try_exists(candidate).await.unwrap_or(false) {
                return Some(PathBuf::from(candidate));
            }
        }
        None
    }

    /// Apply `FAILOVER_*` variables on top of `config`
    ///
    /// # Errors
    /// Returns `InvalidOverride` when a value does not parse
    pub fn apply_env_overrides(&self, config: &mut GatewayConfig) -> Result<(), ConfigError> {
        if let Some(host) = self.env_var("FAILOVER_HOST") {
            config.server.host = host;
        }
        if let Some(port) = self.parsed::<u16>("FAILOVER_PORT")? {
            config.server.port = port;
        }
        if let Some(level) = self.env_var("FAILOVER_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = self.env_var("FAILOVER_LOG_FORMAT") {
            config.logging.format = format;
        }
        if let Some(enabled) = self.parsed::<bool>("FAILOVER_FAULT_INJECTION")? {
            config.fault_injection.enabled = enabled;
        }
        if let Some(limit) = self.parsed::<u32>("FAILOVER_QUOTA_LIMIT")? {
            config.quota.limit = Some(limit);
        }

        for provider in &mut config.providers {
            let prefix = format!("{PROVIDER_ENV_PREFIX}{}_", env_key(&provider.name));

            if let Some(priority) = self.parsed::<i32>(&format!("{prefix}PRIORITY"))? {
                provider.priority = priority;
            }
            if let Some(max_failures) = self.parsed::<u32>(&format!("{prefix}MAX_FAILURES"))? {
                provider.max_failures = max_failures;
            }
            let cooldown_var = format!("{prefix}COOLDOWN");
            if let Some(raw) = self.env_var(&cooldown_var) {
                provider.cooldown_period = parse_duration(&cooldown_var, &raw)?;
            }
        }

        Ok(())
    }

    fn parsed<T: FromStr>(&self, var: &str) -> Result<Option<T>, ConfigError> {
        self.env_var(var)
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidOverride {
                        var: var.to_string(),
                        value: value.clone(),
                    })
            })
            .transpose()
    }
}

/// Provider name as it appears in variable names: `my-provider` becomes `MY_PROVIDER`
fn env_key(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Accepts humantime (`90s`, `2m`) or bare seconds
fn parse_duration(var: &str, raw: &str) -> Result<Duration, ConfigError> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime_serde::re::humantime::parse_duration(raw).map_err(|_| {
        ConfigError::InvalidOverride {
            var: var.to_string(),
            value: raw.to_string(),
        }
    })
}
