//! # Failover Telemetry
//!
//! Observability for the failover gateway.
//!
//! This crate provides:
//! - Structured logging setup (pretty, JSON or compact output)
//! - Prometheus metrics for provider attempts, answers and quota denials

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;
pub mod metrics;

// Re-export main types
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingError};
pub use metrics::{Metrics, MetricsError, LOCAL_FALLBACK_SOURCE};
