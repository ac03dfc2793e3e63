//! # Failover Routing
//!
//! Request routing for the failover gateway.
//!
//! This crate provides:
//! - The failover orchestrator that walks providers in priority order
//! - Quota gates consulted before any provider is contacted
//! - The local fallback responder used when no provider answers
//! - Conversation history sinks

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fallback;
pub mod history;
pub mod orchestrator;
pub mod quota;

// Re-export main types
pub use fallback::LocalFallback;
pub use history::{ConversationTurn, HistorySink, InMemoryHistory, NoopHistory};
pub use orchestrator::FailoverOrchestrator;
pub use quota::{FixedWindowQuota, QuotaDecision, QuotaGate, UnlimitedQuota};
