use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use freshprice_core::config::{AppConfig, ConfigError};
use freshprice_core::domain::dataset::{parse_records, DatasetRecord};
use freshprice_core::inventory::{DashboardSettings, InventoryDashboard};
use freshprice_core::pricing::DeterministicPricingEngine;
use freshprice_db::{
    connect_with_config, load_or_seed_rules, migrations, DbPool, ProductSnapshotRepository,
    RepositoryError, SqlProductSnapshotRepository, SqlRuleRepository,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

/// The dashboard every pricing pass runs against. Passes hold the lock for
/// their whole duration.
pub type SharedDashboard = Arc<Mutex<InventoryDashboard<DeterministicPricingEngine>>>;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub dashboard: SharedDashboard,
    pub snapshots: Arc<dyn ProductSnapshotRepository>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("rule storage failed: {0}")]
    Rules(#[from] RepositoryError),
    #[error("dataset `{path}` could not be loaded: {message}")]
    Dataset { path: PathBuf, message: String },
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let rules = load_or_seed_rules(&SqlRuleRepository::new(db_pool.clone())).await?;
    info!(
        event_name = "system.bootstrap.rules_ready",
        correlation_id = "bootstrap",
        rule_count = rules.len(),
        "pricing rules ready"
    );
    let settings = DashboardSettings {
        variation: config.pricing.variation(),
        tax_rate_pct: config.pricing.tax_rate_pct,
    };
    let mut dashboard = InventoryDashboard::new(DeterministicPricingEngine, rules, settings);

    if let Some(path) = config.pricing.dataset_path.as_deref() {
        let records = read_dataset(path)?;
        let summary = dashboard.load_dataset(records, Utc::now());
        info!(
            event_name = "system.bootstrap.dataset_loaded",
            correlation_id = "bootstrap",
            path = %path.display(),
            total_items = summary.as_ref().map_or(0, |summary| summary.total_items),
            "initial dataset loaded"
        );
    }

    Ok(Application {
        snapshots: Arc::new(SqlProductSnapshotRepository::new(db_pool.clone())),
        config,
        db_pool,
        dashboard: Arc::new(Mutex::new(dashboard)),
    })
}

fn read_dataset(path: &Path) -> Result<Vec<DatasetRecord>, BootstrapError> {
    let dataset_error =
        |message: String| BootstrapError::Dataset { path: path.to_path_buf(), message };
    let raw = fs::read_to_string(path).map_err(|error| dataset_error(error.to_string()))?;
    parse_records(&raw).map_err(|error| dataset_error(error.to_string()))
}
