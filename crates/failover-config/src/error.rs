//! Configuration errors.

use failover_core::GatewayError;
use std::path::PathBuf;

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file could not be parsed
    #[error("Failed to parse config file {path}: {message}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// The file extension is not `.yaml`, `.yml` or `.toml`
    #[error("Unsupported config format: {path}")]
    UnsupportedFormat {
        /// Offending file
        path: PathBuf,
    },

    /// An environment override could not be applied
    #[error("Invalid value {value:?} for {var}")]
    InvalidOverride {
        /// Environment variable name
        var: String,
        /// Rejected value
        value: String,
    },

    /// The configuration is well-formed but not usable
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<validator::ValidationErrors> for ConfigError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<ConfigError> for GatewayError {
    fn from(error: ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}
