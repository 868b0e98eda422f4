//! Routebook HTTP service binary.
//!
//! # Configuration
//!
//! - `ROUTEBOOK_DATABASE_PATH` - SQLite file (default: `routebook.db`, `:memory:` for a throwaway store)
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text
//! - `METRICS_ENABLED` / `METRICS_PATH` - Prometheus endpoint toggle and path

use std::net::SocketAddr;

use tracing::{error, info};

use routebook_service::app;
use routebook_service_shared::{
    init_logging, init_metrics, AppState, LoggingConfig, MetricsConfig, ServiceConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("routebook");
    init_logging(&logging_config)?;

    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        tracing::warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    let config = ServiceConfig::from_env();
    info!(database = %config.database, port = config.port, "starting routebook service");

    let state = AppState::open(&config.database).map_err(|e| {
        error!(error = %e, "failed to open route store");
        e
    })?;

    let router = app(state, &metrics_config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
