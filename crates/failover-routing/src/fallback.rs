//! Locally synthesized answers for when no provider responds.

use failover_core::{AttemptRecord, CompletionRequest, CompletionResponse};
use rand::seq::SliceRandom;

const DEFAULT_MESSAGES: &[&str] = &[
    "I'm having trouble reaching my thinking engines right now. Please try again in a moment.",
    "Sorry, I couldn't come up with an answer just now. Give me a moment and ask again.",
    "All of my AI providers are busy at the moment. Please try again shortly.",
];

/// Canned-response generator
#[derive(Debug, Clone)]
pub struct LocalFallback {
    messages: Vec<String>,
}

impl Default for LocalFallback {
    fn default() -> Self {
        Self {
            messages: DEFAULT_MESSAGES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl LocalFallback {
    /// Use the given messages; falls back to the built-in set when empty
    #[must_use]
    pub fn new(messages: Vec<String>) -> Self {
        let messages: Vec<String> = messages
            .into_iter()
            .filter(|m| !m.trim().is_empty())
            .collect();

        if messages.is_empty() {
            Self::default()
        } else {
            Self { messages }
        }
    }

    /// Configured messages
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Build the fallback answer for `request`
    #[must_use]
    pub fn respond(
        &self,
        request: &CompletionRequest,
        attempts: Vec<AttemptRecord>,
    ) -> CompletionResponse {
        let message = self
            .messages
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default();

        CompletionResponse {
            message,
            provider: None,
            is_fallback: true,
            technique: request.technique.clone(),
            mood: None,
            model: None,
            attempts,
        }
    }
}
