//! Conversation history sinks.
//!
//! The orchestrator hands every answered exchange to a sink and moves on.
//! Sinks must not block and cannot fail the request.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use uuid::Uuid;

/// One answered exchange
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    /// Originating request
    pub request_id: Uuid,
    /// User the exchange belongs to
    pub user_id: String,
    /// What the user sent
    pub message: String,
    /// What the user got back
    pub reply: String,
    /// Provider that answered; `None` for a local fallback
    pub provider: Option<String>,
    /// Whether the answer was a fallback
    pub is_fallback: bool,
    /// When the exchange completed
    pub recorded_at: DateTime<Utc>,
}

/// Fire-and-forget destination for conversation history
pub trait HistorySink: Send + Sync {
    /// Record a turn
    fn record(&self, turn: ConversationTurn);
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHistory;

impl HistorySink for NoopHistory {
    fn record(&self, _turn: ConversationTurn) {}
}

/// Bounded in-memory history, oldest turns evicted first
#[derive(Debug)]
pub struct InMemoryHistory {
    capacity: usize,
    turns: Mutex<VecDeque<ConversationTurn>>,
}

impl InMemoryHistory {
    /// Keep at most `capacity` turns
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            turns: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// Number of stored turns
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.lock().len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.lock().is_empty()
    }

    /// Most recent turns for a user, newest first
    #[must_use]
    pub fn recent(&self, user_id: &str, limit: usize) -> Vec<ConversationTurn> {
        self.turns
            .lock()
            .iter()
            .rev()
            .filter(|turn| turn.user_id == user_id)
            .take(limit)
            .cloned()
            .collect()
    }
}

impl HistorySink for InMemoryHistory {
    fn record(&self, turn: ConversationTurn) {
        let mut turns = self.turns.lock();
        if turns.len() == self.capacity {
            turns.pop_front();
        }
        turns.push_back(turn);
    }
}
