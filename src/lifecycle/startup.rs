//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the report store (verifies the destination)
//! - Start the optional metrics exporter
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigError, IntakeConfig};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::init_metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Bring the service up and serve until `shutdown` is triggered.
pub async fn run(config: IntakeConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let server = HttpServer::new(config.clone())?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        path = %config.intake.path,
        max_body_size = config.intake.max_body_size,
        destination = %config.store.destination,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
