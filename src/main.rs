//! Task service (v1)
//!
//! A small task tracker built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                     TASK SERVICE                     │
//!                     │                                                      │
//!   Client Request    │  ┌──────────┐   ┌─────────────┐   ┌──────────────┐  │
//!   ──────────────────┼─▶│request id│──▶│observability│──▶│   handlers   │  │
//!                     │  │ + trace  │   │ middleware  │   │              │  │
//!                     │  └──────────┘   └─────────────┘   └──────┬───────┘  │
//!                     │                                          │          │
//!                     │                                          ▼          │
//!   Client Response   │                                   ┌──────────────┐  │
//!   ◀─────────────────┼────────────────────────────────── │    store     │──┼──▶ SQLite
//!                     │                                   └──────────────┘  │
//!                     │                                                      │
//!                     │  ┌────────────────────────────────────────────────┐ │
//!                     │  │ config │ lifecycle │ metrics │ OTLP exporter   │ │
//!                     │  └────────────────────────────────────────────────┘ │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use task_service::config::{load_config, CONFIG_PATH_ENV};
use task_service::lifecycle::startup;
use task_service::observability;

#[derive(Parser)]
#[command(name = "task-service")]
#[command(about = "HTTP task tracker with Prometheus metrics and OTLP tracing", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// Override the bind address (e.g. 127.0.0.1:8000).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), cli.bind.as_deref())?;

    // Held until exit so buffered spans are flushed.
    let _telemetry = observability::init_telemetry(&config.telemetry)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        tracing_enabled = config.telemetry.tracing_enabled,
        "task-service starting"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
