//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the intake
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_DATE_PATTERN;

/// Root configuration for the report intake service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IntakeConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Endpoint admission policy.
    pub intake: EndpointConfig,

    /// Report storage settings.
    pub store: StoreConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Maximum requests served concurrently (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            max_connections: 1024,
        }
    }
}

/// Request gate settings for the single intake endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Path the endpoint is mounted on.
    pub path: String,

    /// Largest declared `Content-Length` accepted, in bytes.
    pub max_body_size: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            max_body_size: 512 * 1024, // 512 KiB
        }
    }
}

/// Report storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory records are written to. Empty means the working directory.
    pub destination: String,

    /// Regular expression the `date:` value must match.
    pub date_pattern: String,

    /// Filenames tried per report before giving up.
    pub max_probes: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            destination: String::new(),
            date_pattern: DEFAULT_DATE_PATTERN.to_string(),
            max_probes: 1000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Seconds allowed for receiving a report body.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
