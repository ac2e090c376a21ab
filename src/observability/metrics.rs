//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by route, method, status
//! - `router_request_duration_seconds` (histogram): latency by route
//! - `router_route_not_found_total` (counter): unmatched HTTP requests by interface
//! - `router_method_not_found_total` (counter): unmatched Thrift calls
//! - `dark_traffic_requests_total` (counter): mirrored requests issued
//! - `dark_traffic_success_total` / `dark_traffic_failure_total` /
//!   `dark_traffic_timeout_total` (counters): mirrored call outcomes
//!
//! # Design Decisions
//! - Emitted through the `metrics` facade; no-ops until a recorder is installed
//! - Labels for route, method, status code

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::Interface;

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics exporter listening");
    Ok(())
}

pub fn record_request(route: &str, method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "router_requests_total",
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("router_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_route_not_found(interface: Interface) {
    let interface = match interface {
        Interface::External => "external",
        Interface::Admin => "admin",
    };
    metrics::counter!("router_route_not_found_total", "interface" => interface).increment(1);
}

pub fn record_method_not_found() {
    metrics::counter!("router_method_not_found_total").increment(1);
}

pub fn record_dark_request() {
    metrics::counter!("dark_traffic_requests_total").increment(1);
}

pub fn record_dark_success() {
    metrics::counter!("dark_traffic_success_total").increment(1);
}

pub fn record_dark_failure() {
    metrics::counter!("dark_traffic_failure_total").increment(1);
}

pub fn record_dark_timeout() {
    metrics::counter!("dark_traffic_timeout_total").increment(1);
}
