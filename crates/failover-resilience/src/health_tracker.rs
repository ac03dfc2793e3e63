//! Registry of provider descriptors and their circuit breakers.
//!
//! The tracker is built once at startup and shared behind an `Arc`. The set
//! of providers is fixed after construction; each provider's runtime state
//! sits behind its own lock so unrelated providers never contend.

use crate::circuit_breaker::{CircuitBreaker, CircuitState};
use chrono::{DateTime, Utc};
use failover_core::{ErrorKind, GatewayError, ProviderDescriptor};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

struct TrackedProvider {
    descriptor: ProviderDescriptor,
    breaker: CircuitBreaker,
}

/// Single source of truth for provider availability
pub struct HealthTracker {
    /// Registration order
    providers: Vec<TrackedProvider>,
    /// Name to position in `providers`
    index: HashMap<String, usize>,
    /// Positions sorted by priority, ties in registration order
    priority_order: Vec<usize>,
}

impl HealthTracker {
    /// Build a tracker from descriptors in registration order
    ///
    /// # Errors
    /// Returns error if a descriptor is invalid or a name is registered twice
    pub fn new(
        descriptors: impl IntoIterator<Item = ProviderDescriptor>,
    ) -> Result<Self, GatewayError> {
        let mut providers = Vec::new();
        let mut index = HashMap::new();

        for descriptor in descriptors {
            descriptor.validate()?;
            if index.contains_key(descriptor.name()) {
                return Err(GatewayError::configuration(format!(
                    "provider {} is registered more than once",
                    descriptor.name()
                )));
            }

            index.insert(descriptor.name().to_string(), providers.len());
            let breaker = CircuitBreaker::new(
                descriptor.name(),
                descriptor.max_failures(),
                descriptor.cooldown_period(),
            );
            providers.push(TrackedProvider { descriptor, breaker });
        }

        let mut priority_order: Vec<usize> = (0..providers.len()).collect();
        // Stable sort keeps registration order among equal priorities
        priority_order.sort_by_key(|&i| providers[i].descriptor.priority());

        info!(
            providers = providers.len(),
            order = ?priority_order
                .iter()
                .map(|&i| providers[i].descriptor.name())
                .collect::<Vec<_>>(),
            "Health tracker initialized"
        );

        Ok(Self {
            providers,
            index,
            priority_order,
        })
    }

    /// Tracker with no providers
    #[must_use]
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
            index: HashMap::new(),
            priority_order: Vec::new(),
        }
    }

    /// Number of registered providers
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Whether a provider with this name is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Highest-priority provider regardless of its health
    #[must_use]
    pub fn primary(&self) -> Option<&ProviderDescriptor> {
        self.priority_order
            .first()
            .map(|&i| &self.providers[i].descriptor)
    }

    /// Record a successful call to a provider
    pub fn record_success(&self, name: &str) {
        match self.tracked(name) {
            Some(provider) => provider.breaker.record_success(),
            None => warn!(provider = %name, "Success recorded for unknown provider"),
        }
    }

    /// Record a failed call to a provider
    ///
    /// Every provider-level kind counts the same toward the threshold.
    /// `QuotaExceeded` is not a health signal and is ignored.
    pub fn record_failure(&self, name: &str, kind: ErrorKind) {
        if !kind.is_provider_fault() {
            warn!(provider = %name, kind = %kind, "Ignoring non-provider failure");
            return;
        }
        match self.tracked(name) {
            Some(provider) => {
                provider.breaker.record_failure(kind);
            }
            None => warn!(provider = %name, kind = %kind, "Failure recorded for unknown provider"),
        }
    }

    /// Whether a provider may currently be called
    #[must_use]
    pub fn is_available(&self, name: &str) -> bool {
        self.tracked(name)
            .is_some_and(|provider| provider.breaker.is_available())
    }

    /// Available providers, lowest priority value first
    ///
    /// An empty result means no provider is reachable; it is not an error.
    #[must_use]
    pub fn ordered_available_providers(&self) -> Vec<ProviderDescriptor> {
        self.priority_order
            .iter()
            .map(|&i| &self.providers[i])
            .filter(|provider| provider.breaker.is_available())
            .map(|provider| provider.descriptor.clone())
            .collect()
    }

    /// Force every provider back to a healthy, zero-failure state
    pub fn reset_all(&self) {
        for provider in &self.providers {
            provider.breaker.reset();
        }
        info!(providers = self.providers.len(), "All providers reset");
    }

    /// Read-only view of every provider, in registration order
    #[must_use]
    pub fn snapshot(&self) -> HealthSnapshot {
        let providers = self
            .providers
            .iter()
            .map(|provider| {
                let stats = provider.breaker.stats();
                ProviderSnapshot {
                    name: provider.descriptor.name().to_string(),
                    kind: provider.descriptor.adapter().kind().to_string(),
                    priority: provider.descriptor.priority(),
                    max_failures: provider.descriptor.max_failures(),
                    cooldown_period: provider.descriptor.cooldown_period(),
                    available: stats.available,
                    failure_count: stats.failure_count,
                    state: stats.state,
                    last_failure_at: stats.last_failure_at,
                    last_error: stats.last_error,
                }
            })
            .collect();

        HealthSnapshot { providers }
    }

    fn tracked(&self, name: &str) -> Option<&TrackedProvider> {
        self.index.get(name).map(|&i| &self.providers[i])
    }
}

/// Point-in-time view of all providers
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    /// Providers in registration order
    pub providers: Vec<ProviderSnapshot>,
}

impl HealthSnapshot {
    /// Find a provider by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ProviderSnapshot> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// First available provider by priority, ties in registration order
    #[must_use]
    pub fn active_provider(&self) -> Option<&ProviderSnapshot> {
        self.providers
            .iter()
            .enumerate()
            .filter(|(_, p)| p.available)
            .min_by_key(|(i, p)| (p.priority, *i))
            .map(|(_, p)| p)
    }
}

/// Descriptor plus health state of one provider
#[derive(Debug, Clone)]
pub struct ProviderSnapshot {
    /// Provider name
    pub name: String,
    /// Adapter kind
    pub kind: String,
    /// Routing priority
    pub priority: i32,
    /// Failure threshold
    pub max_failures: u32,
    /// Cooldown after tripping
    pub cooldown_period: Duration,
    /// Whether the provider may be called
    pub available: bool,
    /// Consecutive failures since the last success
    pub failure_count: u32,
    /// Derived breaker state
    pub state: CircuitState,
    /// Wall-clock time of the latest failure
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Classification of the latest failure
    pub last_error: Option<ErrorKind>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use failover_core::{ProviderAdapter, ProviderCall, ProviderError, ProviderReply};
    use std::sync::Arc;

    struct Noop;

    #[async_trait]
    impl ProviderAdapter for Noop {
        fn kind(&self) -> &str {
            "noop"
        }

        async fn invoke(&self, _call: ProviderCall<'_>) -> Result<ProviderReply, ProviderError> {
            Ok(ProviderReply::text("ok"))
        }
    }

    fn descriptor(name: &str, priority: i32) -> ProviderDescriptor {
        ProviderDescriptor::new(name, priority, Arc::new(Noop))
            .with_max_failures(3)
            .with_cooldown(Duration::from_secs(60))
    }

    fn names(descriptors: &[ProviderDescriptor]) -> Vec<&str> {
        descriptors.iter().map(ProviderDescriptor::name).collect()
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = HealthTracker::new(vec![descriptor("a", 1), descriptor("a", 2)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_priority_ordering_independent_of_registration() {
        let tracker = HealthTracker::new(vec![
            descriptor("c", 3),
            descriptor("a", 1),
            descriptor("b", 2),
        ])
        .unwrap();

        assert_eq!(names(&tracker.ordered_available_providers()), vec!["a", "b", "c"]);
        assert_eq!(tracker.primary().map(ProviderDescriptor::name), Some("a"));
    }

    #[test]
    fn test_equal_priority_keeps_registration_order() {
        let tracker = HealthTracker::new(vec![
            descriptor("second", 5),
            descriptor("first", 1),
            descriptor("third", 5),
        ])
        .unwrap();

        assert_eq!(
            names(&tracker.ordered_available_providers()),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn test_unavailable_providers_filtered() {
        let tracker = HealthTracker::new(vec![descriptor("a", 1), descriptor("b", 2)]).unwrap();

        for _ in 0..3 {
            tracker.record_failure("a", ErrorKind::Timeout);
        }

        assert!(!tracker.is_available("a"));
        assert_eq!(names(&tracker.ordered_available_providers()), vec!["b"]);

        for _ in 0..3 {
            tracker.record_failure("b", ErrorKind::Connection);
        }
        assert!(tracker.ordered_available_providers().is_empty());
    }

    #[test]
    fn test_record_success_resets_count() {
        let tracker = HealthTracker::new(vec![descriptor("a", 1)]).unwrap();
        tracker.record_failure("a", ErrorKind::Response);
        tracker.record_failure("a", ErrorKind::Response);
        assert_eq!(tracker.snapshot().get("a").unwrap().failure_count, 2);

        tracker.record_success("a");
        let snapshot = tracker.snapshot();
        let a = snapshot.get("a").unwrap();
        assert_eq!(a.failure_count, 0);
        assert!(a.available);
    }

    #[test]
    fn test_quota_exceeded_never_counts() {
        let tracker = HealthTracker::new(vec![descriptor("a", 1)]).unwrap();
        for _ in 0..5 {
            tracker.record_failure("a", ErrorKind::QuotaExceeded);
        }
        assert_eq!(tracker.snapshot().get("a").unwrap().failure_count, 0);
        assert!(tracker.is_available("a"));
    }

    #[test]
    fn test_unknown_provider_is_ignored() {
        let tracker = HealthTracker::new(vec![descriptor("a", 1)]).unwrap();
        tracker.record_failure("missing", ErrorKind::Timeout);
        tracker.record_success("missing");
        assert!(!tracker.is_available("missing"));
        assert_eq!(tracker.snapshot().providers.len(), 1);
    }

    #[test]
    fn test_reset_all() {
        let tracker = HealthTracker::new(vec![descriptor("a", 1), descriptor("b", 2)]).unwrap();
        for _ in 0..3 {
            tracker.record_failure("a", ErrorKind::Timeout);
            tracker.record_failure("b", ErrorKind::Timeout);
        }
        assert!(tracker.ordered_available_providers().is_empty());

        tracker.reset_all();

        let snapshot = tracker.snapshot();
        for provider in &snapshot.providers {
            assert_eq!(provider.failure_count, 0);
            assert!(provider.available);
            assert_eq!(provider.state, CircuitState::Closed);
        }
        assert_eq!(tracker.ordered_available_providers().len(), 2);
    }

    #[test]
    fn test_snapshot_active_provider() {
        let tracker = HealthTracker::new(vec![descriptor("b", 2), descriptor("a", 1)]).unwrap();
        assert_eq!(tracker.snapshot().active_provider().map(|p| p.name.as_str()), Some("a"));

        for _ in 0..3 {
            tracker.record_failure("a", ErrorKind::Timeout);
        }
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.active_provider().map(|p| p.name.as_str()), Some("b"));
        assert_eq!(snapshot.get("a").unwrap().state, CircuitState::Open);
        assert_eq!(snapshot.get("a").unwrap().last_error, Some(ErrorKind::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_restores_availability_without_reset() {
        let tracker = HealthTracker::new(vec![descriptor("a", 1), descriptor("b", 2)]).unwrap();
        for _ in 0..3 {
            tracker.record_failure("a", ErrorKind::Timeout);
        }
        assert_eq!(names(&tracker.ordered_available_providers()), vec!["b"]);

        tokio::time::advance(Duration::from_secs(60)).await;

        assert_eq!(names(&tracker.ordered_available_providers()), vec!["a", "b"]);
        let snapshot = tracker.snapshot();
        let a = snapshot.get("a").unwrap();
        assert_eq!(a.state, CircuitState::HalfOpen);
        assert_eq!(a.failure_count, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failures_are_not_lost() {
        let tracker = Arc::new(
            HealthTracker::new(vec![
                ProviderDescriptor::new("a", 1, Arc::new(Noop)).with_max_failures(1_000),
            ])
            .unwrap(),
        );

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                tokio::spawn(async move {
                    for _ in 0..50 {
                        tracker.record_failure("a", ErrorKind::Response);
                    }
                })
            })
            .collect();

        for task in futures::future::join_all(tasks).await {
            task.unwrap();
        }

        assert_eq!(tracker.snapshot().get("a").unwrap().failure_count, 400);
    }
}
