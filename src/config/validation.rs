//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sizes, probes, timeouts > 0)
//! - Check addresses parse and the date pattern compiles
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: IntakeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::IntakeConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address is not a socket address: {0}")]
    BindAddress(String),

    #[error("listener.max_connections must be greater than zero")]
    ZeroConnections,

    #[error("intake.path must start with '/': {0}")]
    RelativePath(String),

    #[error("intake.path must be a literal path without captures or wildcards: {0}")]
    PathSyntax(String),

    #[error("intake.max_body_size must be greater than zero")]
    ZeroBodySize,

    #[error("store.date_pattern does not compile: {0}")]
    DatePattern(String),

    #[error("store.max_probes must be greater than zero")]
    ZeroProbes,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("observability.metrics_address is not a socket address: {0}")]
    MetricsAddress(String),
}

/// Check a parsed configuration for values serde cannot rule out.
pub fn validate_config(config: &IntakeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }

    if !config.intake.path.starts_with('/') {
        errors.push(ValidationError::RelativePath(config.intake.path.clone()));
    } else if !is_literal_path(&config.intake.path) {
        errors.push(ValidationError::PathSyntax(config.intake.path.clone()));
    }
    if config.intake.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodySize);
    }

    if let Err(e) = regex::bytes::Regex::new(&config.store.date_pattern) {
        errors.push(ValidationError::DatePattern(e.to_string()));
    }
    if config.store.max_probes == 0 {
        errors.push(ValidationError::ZeroProbes);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The router treats `{..}`, `:name` and `*name` specially and panics on
/// some of them; the endpoint only serves a fixed path.
fn is_literal_path(path: &str) -> bool {
    !path.contains(['{', '}'])
        && path
            .split('/')
            .all(|segment| !segment.starts_with([':', '*']))
}
