//! Error taxonomy for the gateway.
//!
//! Provider-level failures (`Timeout`, `Connection`, `Response`) feed the circuit
//! breaker. `QuotaExceeded` is a caller-level policy outcome and never touches
//! provider health.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result alias used across the gateway crates
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Closed set of failure classifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The provider did not answer within the attempt timeout
    Timeout,
    /// The provider could not be reached
    Connection,
    /// The provider answered with an error status or an unusable body
    Response,
    /// The caller is over quota; raised only by the quota gate
    QuotaExceeded,
}

impl ErrorKind {
    /// Whether this kind is a provider-health signal
    #[must_use]
    pub const fn is_provider_fault(self) -> bool {
        !matches!(self, Self::QuotaExceeded)
    }

    /// Stable lowercase label, used in logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::Response => "response",
            Self::QuotaExceeded => "quota_exceeded",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a provider adapter
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} error from provider: {message}")]
pub struct ProviderError {
    /// Classification used by the circuit breaker
    pub kind: ErrorKind,
    /// Human readable detail
    pub message: String,
    /// Upstream HTTP status, when one was received
    pub status_code: Option<u16>,
}

impl ProviderError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    /// Create a response error
    pub fn response(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Response, message)
    }

    /// Attach the upstream status code
    #[must_use]
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }
}

/// Gateway-level error
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Quota gate denied the request
    #[error("Quota exceeded: {message}")]
    QuotaExceeded {
        /// Message surfaced verbatim to the caller
        message: String,
    },

    /// Invalid request content
    #[error("Validation error: {message}")]
    Validation {
        /// Error message
        message: String,
        /// Offending field
        field: Option<String>,
    },

    /// Invalid configuration or registration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Referenced provider is not registered
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>, field: Option<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::ProviderNotFound(_) => 404,
            Self::QuotaExceeded { .. } => 429,
            Self::Configuration { .. } | Self::Internal(_) => 500,
        }
    }
}
