//! Quota gates.
//!
//! A gate answers, once per request and before any provider I/O, whether the
//! caller may issue another completion.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Message returned when a gate denies without one of its own
pub const DEFAULT_QUOTA_MESSAGE: &str =
    "You have reached your message limit. Please try again later.";

/// Answer from a quota gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// User-facing explanation, surfaced verbatim on denial
    pub message: Option<String>,
}

impl QuotaDecision {
    /// Allow the request
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            message: None,
        }
    }

    /// Deny the request with a message for the user
    #[must_use]
    pub fn deny(message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            message: Some(message.into()),
        }
    }
}

/// Per-user request gate
#[async_trait]
pub trait QuotaGate: Send + Sync {
    /// Decide whether `user_id` may issue another completion request
    async fn check(&self, user_id: &str) -> QuotaDecision;
}

/// Gate that allows everything
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlimitedQuota;

#[async_trait]
impl QuotaGate for UnlimitedQuota {
    async fn check(&self, _user_id: &str) -> QuotaDecision {
        QuotaDecision::allow()
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    used: u32,
}

/// Fixed-window request limit per user
#[derive(Debug)]
pub struct FixedWindowQuota {
    limit: u32,
    window: Duration,
    message: String,
    usage: DashMap<String, Window>,
    last_sweep: Mutex<Instant>,
}

impl FixedWindowQuota {
    /// Allow `limit` requests per user in every `window`
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            message: DEFAULT_QUOTA_MESSAGE.to_string(),
            usage: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Set the denial message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Requests left for `user_id` in the current window
    #[must_use]
    pub fn remaining(&self, user_id: &str) -> u32 {
        self.usage.get(user_id).map_or(self.limit, |window| {
            if window.started.elapsed() >= self.window {
                self.limit
            } else {
                self.limit.saturating_sub(window.used)
            }
        })
    }

    /// Users currently holding a window
    #[must_use]
    pub fn tracked_users(&self) -> usize {
        self.usage.len()
    }

    /// Drop expired windows, at most once per window length
    fn sweep(&self, now: Instant) {
        {
            let mut last = self.last_sweep.lock();
            if now.duration_since(*last) < self.window {
                return;
            }
            *last = now;
        }

        let before = self.usage.len();
        self.usage
            .retain(|_, w| now.duration_since(w.started) < self.window);
        let removed = before.saturating_sub(self.usage.len());
        if removed > 0 {
            debug!(removed, remaining = self.usage.len(), "Expired quota windows dropped");
        }
    }
}

#[async_trait]
impl QuotaGate for FixedWindowQuota {
    async fn check(&self, user_id: &str) -> QuotaDecision {
        let now = Instant::now();
        self.sweep(now);

        let mut window = self.usage.entry(user_id.to_string()).or_insert(Window {
            started: now,
            used: 0,
        });

        if now.duration_since(window.started) >= self.window {
            *window = Window {
                started: now,
                used: 0,
            };
        }

        if window.used >= self.limit {
            debug!(user = %user_id, limit = self.limit, "Quota exhausted");
            return QuotaDecision::deny(self.message.clone());
        }

        window.used += 1;
        QuotaDecision::allow()
    }
}
