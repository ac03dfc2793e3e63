//! Circuit breaker for a single provider.
//!
//! The breaker counts consecutive failures. Once the count reaches the
//! provider's threshold the provider is skipped until its cooldown has elapsed
//! since the most recent failure. Recovery is lazy: availability is
//! re-evaluated whenever it is queried, and the failure count is only cleared
//! by a success.

use chrono::{DateTime, Utc};
use failover_core::ErrorKind;
use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Circuit breaker states, derived from the stored failure count and timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Below the failure threshold, requests flow normally
    Closed,
    /// Threshold reached and still cooling down, provider is skipped
    Open,
    /// Threshold reached but cooldown elapsed, the next outcome decides
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Mutable runtime state of one provider
#[derive(Debug, Clone, Default)]
struct ProviderHealthState {
    available: bool,
    failure_count: u32,
    last_failure_at: Option<Instant>,
    last_failure_wall: Option<DateTime<Utc>>,
    last_error: Option<ErrorKind>,
}

impl ProviderHealthState {
    fn healthy() -> Self {
        Self {
            available: true,
            ..Default::default()
        }
    }
}

/// Circuit breaker for a single provider
pub struct CircuitBreaker {
    /// Provider identifier
    provider_id: String,
    /// Consecutive failures that open the circuit
    max_failures: u32,
    /// Time the circuit stays open after the latest failure
    cooldown: Duration,
    /// All fields change together under this lock
    state: Mutex<ProviderHealthState>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    #[must_use]
    pub fn new(provider_id: impl Into<String>, max_failures: u32, cooldown: Duration) -> Self {
        Self {
            provider_id: provider_id.into(),
            max_failures: max_failures.max(1),
            cooldown,
            state: Mutex::new(ProviderHealthState::healthy()),
        }
    }

    /// Re-evaluate the breaker and report whether the provider may be called
    pub fn is_available(&self) -> bool {
        let mut state = self.state.lock();
        self.refresh(&mut state) != CircuitState::Open
    }

    /// Current state after lazy re-evaluation
    pub fn state(&self) -> CircuitState {
        let mut state = self.state.lock();
        self.refresh(&mut state)
    }

    /// Record a successful call
    pub fn record_success(&self) {
        let mut state = self.state.lock();
        let previous = state.failure_count;
        state.failure_count = 0;
        state.available = true;

        if previous >= self.max_failures {
            info!(
                provider = %self.provider_id,
                previous_failures = previous,
                "Circuit breaker closed"
            );
        } else if previous > 0 {
            debug!(
                provider = %self.provider_id,
                previous_failures = previous,
                "Failure count cleared by success"
            );
        }
    }

    /// Record a failed call and return the resulting state
    pub fn record_failure(&self, kind: ErrorKind) -> CircuitState {
        let mut state = self.state.lock();
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure_at = Some(Instant::now());
        state.last_failure_wall = Some(Utc::now());
        state.last_error = Some(kind);

        if state.failure_count < self.max_failures {
            debug!(
                provider = %self.provider_id,
                kind = %kind,
                failure_count = state.failure_count,
                threshold = self.max_failures,
                "Provider failure recorded"
            );
            return CircuitState::Closed;
        }

        if state.available {
            warn!(
                provider = %self.provider_id,
                kind = %kind,
                failure_count = state.failure_count,
                cooldown_secs = self.cooldown.as_secs(),
                "Circuit breaker opened"
            );
        }
        state.available = false;
        self.refresh(&mut state)
    }

    /// Reset the circuit breaker to closed state
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let last_failure_wall = state.last_failure_wall;
        let last_error = state.last_error;
        *state = ProviderHealthState {
            last_failure_wall,
            last_error,
            ..ProviderHealthState::healthy()
        };
    }

    /// Get current statistics
    pub fn stats(&self) -> BreakerStats {
        let mut state = self.state.lock();
        let circuit = self.refresh(&mut state);
        BreakerStats {
            state: circuit,
            available: state.available,
            failure_count: state.failure_count,
            last_failure_at: state.last_failure_wall,
            last_error: state.last_error,
        }
    }

    /// Apply the availability invariant to the stored state
    fn refresh(&self, state: &mut ProviderHealthState) -> CircuitState {
        if state.failure_count < self.max_failures {
            state.available = true;
            return CircuitState::Closed;
        }

        let cooling = state
            .last_failure_at
            .is_some_and(|at| at.elapsed() < self.cooldown);

        if cooling {
            state.available = false;
            CircuitState::Open
        } else {
            if !state.available {
                info!(
                    provider = %self.provider_id,
                    failure_count = state.failure_count,
                    "Cooldown elapsed, circuit breaker half-open"
                );
            }
            state.available = true;
            CircuitState::HalfOpen
        }
    }
}

/// Circuit breaker statistics
#[derive(Debug, Clone)]
pub struct BreakerStats {
    /// Current state
    pub state: CircuitState,
    /// Whether the provider may be called
    pub available: bool,
    /// Consecutive failures since the last success
    pub failure_count: u32,
    /// Wall-clock time of the latest failure
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Classification of the latest failure
    pub last_error: Option<ErrorKind>,
}
