//! # Failover Core
//!
//! Core types, traits, and error handling for the failover gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - Completion request and response types
//! - The `ProviderAdapter` capability and provider descriptors
//! - The error taxonomy shared by the breaker, the orchestrator and the HTTP layer

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod provider;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use error::{ErrorKind, GatewayError, GatewayResult, ProviderError};
pub use provider::{ProviderAdapter, ProviderDescriptor, ProviderReply};
pub use request::{CompletionRequest, CompletionRequestBuilder, ProviderCall, SimulatedFault};
pub use response::{AttemptOutcome, AttemptRecord, CompletionOutcome, CompletionResponse};
