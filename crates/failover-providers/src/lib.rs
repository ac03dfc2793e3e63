//! # Failover Providers
//!
//! Upstream AI provider adapters for the failover gateway.
//!
//! This crate provides:
//! - OpenAI Chat Completions adapter (also fits OpenAI-compatible servers)
//! - Anthropic Messages adapter
//! - Transport error classification into timeout, connection and response faults
//! - Registration of configured providers as descriptors

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod anthropic;
mod http;
pub mod openai;
pub mod registry;

pub use anthropic::{AnthropicAdapter, AnthropicConfig};
pub use openai::{OpenAiAdapter, OpenAiConfig};
pub use registry::{build_adapter, describe, ProviderRegistry};
