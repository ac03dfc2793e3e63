//! Request types for the gateway.
//!
//! `CompletionRequest` is what a caller submits. `ProviderCall` is the
//! per-attempt view handed to a single provider adapter.

use crate::error::{ErrorKind, GatewayError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User identifier applied when the caller supplies none
pub const ANONYMOUS_USER: &str = "anonymous";

/// Failure kinds that can be simulated against a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulatedFault {
    /// Behave as if the provider timed out
    Timeout,
    /// Behave as if the provider was unreachable
    Connection,
    /// Behave as if the provider returned an unusable response
    Response,
}

impl From<SimulatedFault> for ErrorKind {
    fn from(fault: SimulatedFault) -> Self {
        match fault {
            SimulatedFault::Timeout => Self::Timeout,
            SimulatedFault::Connection => Self::Connection,
            SimulatedFault::Response => Self::Response,
        }
    }
}

/// A chat completion request as submitted by a caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Unique request identifier
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// User message text
    pub message: String,

    /// Optional technique hint forwarded to providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technique: Option<String>,

    /// Failure to simulate on the first provider attempted (test mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulate_error: Option<SimulatedFault>,

    /// User or session identifier used for the quota check
    #[serde(default = "default_user")]
    pub user_id: String,
}

fn default_user() -> String {
    ANONYMOUS_USER.to_string()
}

impl CompletionRequest {
    /// Create a request for the given message with defaults elsewhere
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::builder().message(message).build()
    }

    /// Create a new builder for `CompletionRequest`
    #[must_use]
    pub fn builder() -> CompletionRequestBuilder {
        CompletionRequestBuilder::default()
    }

    /// Validate the request
    ///
    /// # Errors
    /// Returns error if the message is blank
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.message.trim().is_empty() {
            return Err(GatewayError::validation(
                "message cannot be empty",
                Some("message".to_string()),
            ));
        }
        Ok(())
    }

    /// Build the view handed to the adapter on the given attempt (0-indexed)
    #[must_use]
    pub fn call_for_attempt(&self, attempt: usize) -> ProviderCall<'_> {
        ProviderCall {
            request_id: self.id,
            message: &self.message,
            technique: self.technique.as_deref(),
            attempt,
            simulated_fault: if attempt == 0 { self.simulate_error } else { None },
        }
    }
}

/// Builder for `CompletionRequest`
#[derive(Debug, Default)]
pub struct CompletionRequestBuilder {
    id: Option<Uuid>,
    message: String,
    technique: Option<String>,
    simulate_error: Option<SimulatedFault>,
    user_id: Option<String>,
}

impl CompletionRequestBuilder {
    /// Set the request ID
    #[must_use]
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the message text
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the technique hint
    #[must_use]
    pub fn technique(mut self, technique: impl Into<String>) -> Self {
        self.technique = Some(technique.into());
        self
    }

    /// Simulate a failure on the first attempted provider
    #[must_use]
    pub fn simulate_error(mut self, fault: SimulatedFault) -> Self {
        self.simulate_error = Some(fault);
        self
    }

    /// Set the user identifier
    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Build the request
    #[must_use]
    pub fn build(self) -> CompletionRequest {
        CompletionRequest {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            message: self.message,
            technique: self.technique,
            simulate_error: self.simulate_error,
            user_id: self.user_id.unwrap_or_else(default_user),
        }
    }
}

/// What a single provider attempt sees
#[derive(Debug, Clone, Copy)]
pub struct ProviderCall<'a> {
    /// Identifier of the originating request
    pub request_id: Uuid,
    /// User message text
    pub message: &'a str,
    /// Technique hint
    pub technique: Option<&'a str>,
    /// Position of this attempt within the request (0 = first)
    pub attempt: usize,
    /// Request-scoped failure directive, honoured only by the fault-injection decorator
    pub simulated_fault: Option<SimulatedFault>,
}
