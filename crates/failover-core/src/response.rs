//! Response types for the gateway.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A completed answer, either from a provider or synthesized locally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated message text
    pub message: String,

    /// Provider that served the answer; `None` for a local fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// True unless the primary provider answered
    pub is_fallback: bool,

    /// Technique annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technique: Option<String>,

    /// Mood annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,

    /// Provider-specific model identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Every provider attempt made for this request, in order
    #[serde(skip)]
    pub attempts: Vec<AttemptRecord>,
}

impl CompletionResponse {
    /// Whether this answer was synthesized locally rather than by a provider
    #[must_use]
    pub fn is_local_fallback(&self) -> bool {
        self.provider.is_none()
    }
}

/// Result of orchestrating one request
#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    /// The caller got an answer (real or fallback)
    Completed(CompletionResponse),
    /// The quota gate denied the request; no provider was contacted
    QuotaExceeded {
        /// User-facing message from the quota gate
        message: String,
    },
}

impl CompletionOutcome {
    /// Borrow the response, if there is one
    #[must_use]
    pub fn response(&self) -> Option<&CompletionResponse> {
        match self {
            Self::Completed(response) => Some(response),
            Self::QuotaExceeded { .. } => None,
        }
    }

    /// Whether the request was denied by the quota gate
    #[must_use]
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// How a single provider attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The provider answered
    Success,
    /// The provider failed with the given classification
    Failure(ErrorKind),
}

impl AttemptOutcome {
    /// Metric label for the outcome
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure(kind) => kind.as_str(),
        }
    }
}

/// One provider attempt
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// Provider name
    pub provider: String,
    /// Outcome
    pub outcome: AttemptOutcome,
    /// Wall time spent on the attempt
    pub latency: Duration,
}
