mod bootstrap;
mod health;
mod scheduler;

use std::time::Duration;

use anyhow::Result;
use freshprice_core::config::{AppConfig, LoadOptions};
use tracing_subscriber::EnvFilter;

use crate::health::HealthState;

fn init_logging(config: &AppConfig) {
    use freshprice_core::config::LogFormat::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(filter);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        HealthState { db_pool: app.db_pool.clone(), dashboard: app.dashboard.clone() },
    )
    .await?;

    let scheduler = scheduler::spawn(
        app.dashboard.clone(),
        app.snapshots.clone(),
        Duration::from_secs(app.config.pricing.refresh_interval_secs),
    );

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        refresh_interval_secs = app.config.pricing.refresh_interval_secs,
        "freshprice-server started"
    );
    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "freshprice-server stopping"
    );

    scheduler.abort();
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    if tokio::time::timeout(grace, app.db_pool.close()).await.is_err() {
        tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            grace_secs = app.config.server.graceful_shutdown_secs,
            "database pool did not close within the grace period"
        );
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
