//! Dark-traffic mirroring.
//!
//! # Data Flow
//! ```text
//! Request ──▶ DarkTrafficFilter ──sample?──no──▶ next (untouched)
//!                    │
//!                   yes: request.mirror()
//!                    │
//!    forward_after_service = true:  next → response ready → spawn dark call
//!    forward_after_service = false: spawn dark call → next
//!                    │
//!              tokio::spawn + timeout ──▶ DarkClient::send
//!                    │
//!              DarkTrafficStats / metrics (success, failure, timeout)
//! ```
//!
//! # Design Decisions
//! - The dark call never changes the primary result: its outcome only moves
//!   counters
//! - Dark calls are detached tasks with their own timeout, so an abandoned
//!   primary request cannot leak them
//! - The destination client is created once per filter and reused

pub mod client;
pub mod filter;

pub use client::{DarkClient, HttpMirrorClient};
pub use filter::{
    always, chain_from_config, from_config, never, ratio_sampler, DarkTrafficFilter, DarkTrafficSnapshot,
    DarkTrafficStats, Sampler,
};

use axum::http::StatusCode;

/// Produce an independent copy of a request for a secondary destination.
pub trait Mirror: Sized + Send + 'static {
    fn mirror(&self) -> Self;
}

/// Errors from building or calling the dark destination.
#[derive(Debug, thiserror::Error)]
pub enum DarkTrafficError {
    #[error("invalid dark traffic destination {destination:?}: {reason}")]
    InvalidDestination { destination: String, reason: String },

    #[error("failed to build mirrored request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("dark destination request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("dark destination answered {0}")]
    Status(StatusCode),

    #[error("dark call timed out")]
    Timeout,
}
