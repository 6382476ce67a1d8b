use freshprice_core::config::{AppConfig, LoadOptions};
use freshprice_core::errors::ApplicationError;
use freshprice_db::{
    connect_with_config, migrations, DbPool, InMemoryRuleRepository, InMemorySaleRepository,
    RuleRepository, SaleRepository, SqlRuleRepository, SqlSaleRepository,
};
use tokio::runtime::Runtime;

use crate::commands::CommandResult;

/// A command failure with its error class and exit code.
///
/// Exit codes: 2 config or input, 3 runtime, 4 connectivity, 5 migration,
/// 6 rejected by the domain, 7 persistence.
pub(crate) struct Failure {
    pub class: &'static str,
    pub message: String,
    pub exit_code: u8,
}

impl Failure {
    pub fn new(class: &'static str, exit_code: u8, message: impl Into<String>) -> Self {
        Self { class, message: message.into(), exit_code }
    }

    pub fn into_result(self, command: &str) -> CommandResult {
        CommandResult::failure(command, self.class, self.message, self.exit_code)
    }
}

impl From<ApplicationError> for Failure {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Configuration(_) => {
                Self::new("config_validation", 2, format!("configuration issue: {error}"))
            }
            ApplicationError::Domain(_) => Self::new("rejected", 6, error.to_string()),
            ApplicationError::Persistence(_) => Self::new("persistence", 7, error.to_string()),
        }
    }
}

pub(crate) fn load_config() -> Result<AppConfig, Failure> {
    AppConfig::load(LoadOptions::default())
        .map_err(|error| ApplicationError::Configuration(error.to_string()).into())
}

pub(crate) fn runtime() -> Result<Runtime, Failure> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        Failure::new("runtime_init", 3, format!("failed to initialize async runtime: {error}"))
    })
}

/// Opens the configured database and applies pending migrations.
pub(crate) async fn connect_and_migrate(config: &AppConfig) -> Result<DbPool, Failure> {
    let pool = connect_with_config(&config.database)
        .await
        .map_err(|error| Failure::new("db_connectivity", 4, error.to_string()))?;
    if let Err(error) = migrations::run_pending(&pool).await {
        pool.close().await;
        return Err(Failure::new("migration", 5, error.to_string()));
    }
    Ok(pool)
}

/// The rule and sale repositories one command works against. A dry run keeps
/// both in memory and never opens the database.
pub(crate) struct Storage {
    pub rules: Box<dyn RuleRepository>,
    pub sales: Box<dyn SaleRepository>,
    pool: Option<DbPool>,
}

impl Storage {
    pub fn in_memory() -> Self {
        Self {
            rules: Box::new(InMemoryRuleRepository::default()),
            sales: Box::new(InMemorySaleRepository::default()),
            pool: None,
        }
    }

    pub async fn open(config: &AppConfig) -> Result<Self, Failure> {
        let pool = connect_and_migrate(config).await?;
        Ok(Self {
            rules: Box::new(SqlRuleRepository::new(pool.clone())),
            sales: Box::new(SqlSaleRepository::new(pool.clone())),
            pool: Some(pool),
        })
    }

    pub async fn open_or_in_memory(config: Option<&AppConfig>) -> Result<Self, Failure> {
        match config {
            Some(config) => Self::open(config).await,
            None => Ok(Self::in_memory()),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.pool.is_some()
    }

    pub async fn close(self) {
        if let Some(pool) = self.pool {
            pool.close().await;
        }
    }
}
