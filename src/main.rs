//! Usage report intake service.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                REPORT INTAKE                  │
//!                      │                                               │
//!   POST /  ───────────┼─▶ http::server ─▶ http::gate ─▶ body read     │
//!                      │        │                          │           │
//!                      │        │                          ▼           │
//!   text/plain ◀───────┼── http::response ◀──────── store::disk        │
//!                      │                                   │           │
//!                      │                                   ▼           │
//!                      │                     <destination>/report_*.txt │
//!                      │                                               │
//!                      │   config · observability · lifecycle          │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use report_intake::config::{load_config, validate_config, ConfigError, IntakeConfig};
use report_intake::lifecycle::{shutdown_on_signal, startup, Shutdown};
use report_intake::observability::init_logging;

#[derive(Parser, Debug)]
#[command(name = "report-intake", version)]
#[command(about = "HTTP endpoint that archives submitted usage reports", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(long)]
    bind: Option<String>,

    /// Override `store.destination`.
    #[arg(long)]
    destination: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<IntakeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => IntakeConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(destination) = self.destination {
            config.store.destination = destination;
        }

        // Overrides bypass the loader's checks.
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    init_logging(&config.observability);
    tracing::info!("report-intake v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    startup::run(config, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
