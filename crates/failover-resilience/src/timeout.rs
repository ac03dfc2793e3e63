//! Bounded provider attempts.

use failover_core::{ProviderCall, ProviderDescriptor, ProviderError, ProviderReply};
use tracing::debug;

/// Invoke the descriptor's adapter, failing with `Timeout` once its deadline passes
///
/// # Errors
/// Returns the adapter's error, or a timeout error if the deadline is exceeded
pub async fn invoke_with_timeout(
    descriptor: &ProviderDescriptor,
    call: ProviderCall<'_>,
) -> Result<ProviderReply, ProviderError> {
    let deadline = descriptor.timeout();

    match tokio::time::timeout(deadline, descriptor.adapter().invoke(call)).await {
        Ok(result) => result,
        Err(_) => {
            debug!(
                provider = %descriptor.name(),
                timeout_ms = deadline.as_millis(),
                "Provider attempt timed out"
            );
            Err(ProviderError::timeout(format!(
                "no response within {}ms",
                deadline.as_millis()
            )))
        }
    }
}
