//! Integration tests for the failover gateway
//!
//! These tests run the real HTTP server against wiremock upstreams that
//! speak the OpenAI and Anthropic wire formats, covering:
//! - Failover between providers on upstream errors and timeouts
//! - Circuit breaker trips, recovery and manual reset
//! - Failure simulation and quota enforcement over HTTP

pub mod helpers;
pub mod mock_providers;

// Re-export commonly used items
pub use helpers::*;
pub use mock_providers::*;

#[cfg(test)]
mod api_tests;
#[cfg(test)]
mod failover_tests;
