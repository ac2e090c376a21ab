//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sample rate, timeouts)
//! - Check that addresses and the dark destination parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::RouterConfig;
use crate::dark_traffic::client::parse_destination;

/// A single semantic problem, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "server.bind_address", &config.server.bind_address);
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::new("server.max_body_bytes", "must be greater than 0"));
    }

    if config.admin.enabled {
        check_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }

    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let dark = &config.dark_traffic;
    if !(0.0..=1.0).contains(&dark.sample_rate) {
        errors.push(ValidationError::new(
            "dark_traffic.sample_rate",
            format!("{} is outside [0, 1]", dark.sample_rate),
        ));
    }
    if dark.timeout_ms == 0 {
        errors.push(ValidationError::new("dark_traffic.timeout_ms", "must be greater than 0"));
    }
    if let Some(destination) = &dark.destination {
        if let Err(e) = parse_destination(destination) {
            errors.push(ValidationError::new("dark_traffic.destination", e.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("{value:?} is not a socket address")));
    }
}
