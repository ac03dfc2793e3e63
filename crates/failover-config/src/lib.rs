//! # Failover Config
//!
//! Configuration for the failover gateway.
//!
//! This crate provides:
//! - Typed configuration for the listener, providers, quota, fault injection,
//!   fallback answers and logging
//! - YAML and TOML file loading
//! - `FAILOVER_*` environment overrides
//! - Validation, including duplicate provider detection

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{parse_config, ConfigFormat, ConfigLoader, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATHS};
pub use types::{
    FallbackConfig, FaultInjectionConfig, GatewayConfig, LoggingSettings, ProviderConfig,
    ProviderKind, QuotaConfig, ServerConfig,
};
