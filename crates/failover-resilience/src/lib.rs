//! # Failover Resilience
//!
//! Resilience patterns for the failover gateway:
//! - Per-provider circuit breaker with cooldown and lazy recovery
//! - Health tracker owning every provider's breaker
//! - Fault injection decorator for exercising failover in tests
//! - Bounded attempt timeouts

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod circuit_breaker;
pub mod fault_injection;
pub mod health_tracker;
pub mod timeout;

// Re-export main types
pub use circuit_breaker::{BreakerStats, CircuitBreaker, CircuitState};
pub use fault_injection::{FailureInjector, FaultInjectingAdapter};
pub use health_tracker::{HealthSnapshot, HealthTracker, ProviderSnapshot};
pub use timeout::invoke_with_timeout;
