//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check route entries are well formed enough to register
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Route patterns and conflicts are not checked here; the router's
//!   registration policy (skip or strict) owns those

use std::fmt;
use std::net::SocketAddr;

use axum::http::Method;
use tracing_subscriber::EnvFilter;

use crate::config::schema::RouterConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field (e.g., "routes[2].method").
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::new("listener.max_body_size", "must be greater than 0"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("{:?} is not a valid filter directive", config.observability.log_level),
        ));
    }

    if let Some(name) = &config.routing.not_found_handler {
        if name.trim().is_empty() {
            errors.push(ValidationError::new("routing.not_found_handler", "must not be empty"));
        }
    }

    for (idx, route) in config.routes.iter().enumerate() {
        if Method::from_bytes(route.method.to_ascii_uppercase().as_bytes()).is_err() {
            errors.push(ValidationError::new(
                format!("routes[{idx}].method"),
                format!("{:?} is not an HTTP method", route.method),
            ));
        }
        if route.handler.trim().is_empty() {
            errors.push(ValidationError::new(format!("routes[{idx}].handler"), "must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
