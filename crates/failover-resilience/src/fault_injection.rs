//! Fault injection for exercising failover without real outages.
//!
//! [`FaultInjectingAdapter`] wraps a real adapter. Before the inner adapter is
//! touched it checks, in order:
//! 1. the request-scoped directive carried by the call, then
//! 2. a one-shot directive armed on the shared [`FailureInjector`].
//!
//! Either one short-circuits with a synthetic error of the requested kind.
//! Adapters are only wrapped when fault injection is enabled, so production
//! call paths carry no test branches.

use async_trait::async_trait;
use failover_core::{
    ErrorKind, ProviderAdapter, ProviderCall, ProviderDescriptor, ProviderError, ProviderReply,
    SimulatedFault,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// One-shot failure directives keyed by provider name
#[derive(Debug, Default)]
pub struct FailureInjector {
    armed: Mutex<HashMap<String, SimulatedFault>>,
}

impl FailureInjector {
    /// Create an injector with nothing armed
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next attempt on `provider` fail with `fault`
    ///
    /// Re-arming a provider replaces its pending directive.
    pub fn arm(&self, provider: impl Into<String>, fault: SimulatedFault) {
        let provider = provider.into();
        info!(provider = %provider, fault = ?fault, "Failure injection armed");
        self.armed.lock().insert(provider, fault);
    }

    /// Remove and return the pending directive for `provider`
    pub fn take(&self, provider: &str) -> Option<SimulatedFault> {
        self.armed.lock().remove(provider)
    }

    /// Whether a directive is pending for `provider`
    #[must_use]
    pub fn is_armed(&self, provider: &str) -> bool {
        self.armed.lock().contains_key(provider)
    }

    /// Drop every pending directive
    pub fn clear(&self) {
        self.armed.lock().clear();
    }

    /// Wrap a descriptor's adapter so it honours this injector
    #[must_use]
    pub fn instrument(self: &Arc<Self>, descriptor: ProviderDescriptor) -> ProviderDescriptor {
        let provider = descriptor.name().to_string();
        let injector = Arc::clone(self);
        descriptor.map_adapter(move |inner| {
            Arc::new(FaultInjectingAdapter::new(provider, inner, injector))
        })
    }
}

/// Adapter decorator that fails on demand
pub struct FaultInjectingAdapter {
    provider: String,
    inner: Arc<dyn ProviderAdapter>,
    injector: Arc<FailureInjector>,
}

impl FaultInjectingAdapter {
    /// Wrap `inner`, consulting `injector` under the name `provider`
    #[must_use]
    pub fn new(
        provider: impl Into<String>,
        inner: Arc<dyn ProviderAdapter>,
        injector: Arc<FailureInjector>,
    ) -> Self {
        Self {
            provider: provider.into(),
            inner,
            injector,
        }
    }
}

#[async_trait]
impl ProviderAdapter for FaultInjectingAdapter {
    fn kind(&self) -> &str {
        self.inner.kind()
    }

    async fn invoke(&self, call: ProviderCall<'_>) -> Result<ProviderReply, ProviderError> {
        let directive = match call.simulated_fault {
            Some(fault) => Some((fault, "request")),
            None => self.injector.take(&self.provider).map(|fault| (fault, "armed")),
        };

        match directive {
            Some((fault, source)) => {
                info!(
                    provider = %self.provider,
                    request_id = %call.request_id,
                    attempt = call.attempt,
                    fault = ?fault,
                    source,
                    "Injecting simulated provider failure"
                );
                Err(injected_error(fault))
            }
            None => self.inner.invoke(call).await,
        }
    }
}

fn injected_error(fault: SimulatedFault) -> ProviderError {
    match ErrorKind::from(fault) {
        ErrorKind::Timeout => ProviderError::timeout("simulated timeout"),
        ErrorKind::Connection => ProviderError::connection("simulated connection failure"),
        _ => ProviderError::response("simulated invalid response").with_status(500),
    }
}
