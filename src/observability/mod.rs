//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Routers, filters, dark traffic produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape), installed by the binary
//! ```
//!
//! # Design Decisions
//! - Library code only emits; installing a subscriber or recorder is left to
//!   the binary, so tests and embedders stay in control
//! - Request ID flows through log fields
//! - Metrics are cheap (atomic increments); with no recorder they are no-ops

pub mod logging;
pub mod metrics;
