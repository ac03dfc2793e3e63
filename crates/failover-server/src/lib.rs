//! # Failover Server
//!
//! HTTP surface of the failover gateway.
//!
//! This crate provides:
//! - `POST /chat` answered with provider failover and a local fallback
//! - Provider status, reset and failure simulation endpoints
//! - Health and Prometheus metrics endpoints
//! - Graceful shutdown handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use error::ApiError;
pub use routes::create_router;
pub use server::{shutdown_signal, Server, ServerConfig};
pub use state::{AppState, AppStateBuilder};
