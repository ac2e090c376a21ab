//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every section has defaults so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the router binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// External (public) listener.
    pub server: ServerConfig,

    /// Admin listener.
    pub admin: AdminConfig,

    /// Dark-traffic mirroring.
    pub dark_traffic: DarkTrafficConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// External listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum buffered request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Admin interface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve admin routes at all.
    pub enabled: bool,

    /// Admin listener bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:9990".to_string(),
        }
    }
}

/// Dark-traffic mirroring configuration.
///
/// With no `destination` the filter is disabled and acts as identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DarkTrafficConfig {
    /// `host:port` or `http://host:port` of the dark service.
    pub destination: Option<String>,

    /// Sent as `x-client-id` on mirrored requests when non-empty.
    pub client_id: String,

    /// Multiplex mirrored requests over HTTP/2 connections.
    pub mux_enabled: bool,

    /// Mirror after the primary response is ready rather than concurrently.
    pub forward_after_service: bool,

    /// Fraction of requests mirrored, in `[0, 1]`.
    pub sample_rate: f64,

    /// Upper bound on a single mirrored call.
    pub timeout_ms: u64,
}

impl Default for DarkTrafficConfig {
    fn default() -> Self {
        Self {
            destination: None,
            client_id: String::new(),
            mux_enabled: true,
            forward_after_service: true,
            sample_rate: 0.0,
            timeout_ms: 1000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Compact single-line log format.
    pub compact_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            compact_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
