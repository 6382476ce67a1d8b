use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use freshprice_core::domain::product::Product;
use freshprice_core::domain::rule::PricingRule;
use freshprice_core::domain::sale::Sale;
use freshprice_core::errors::ApplicationError;

pub mod memory;
pub mod product_snapshot;
pub mod rule;
pub mod sale;

pub use memory::{InMemoryProductSnapshotRepository, InMemoryRuleRepository, InMemorySaleRepository};
pub use product_snapshot::SqlProductSnapshotRepository;
pub use rule::{load_or_seed_rules, SqlRuleRepository};
pub use sale::SqlSaleRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        ApplicationError::Persistence(error.to_string())
    }
}

/// Last priced state of every product, written after each pricing pass.
#[async_trait]
pub trait ProductSnapshotRepository: Send + Sync {
    /// Inserts or replaces one row per product and returns the number written.
    /// Products absent from `products` are left untouched.
    async fn upsert_all(
        &self,
        products: &[Product],
        priced_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError>;

    /// Soonest-expiring first, ties broken by product id.
    async fn list_by_expiry(&self) -> Result<Vec<Product>, RepositoryError>;
}

#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Rules in ascending priority.
    async fn list_ordered(&self) -> Result<Vec<PricingRule>, RepositoryError>;

    /// Replaces the stored rule set atomically.
    async fn replace_all(&self, rules: &[PricingRule]) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait SaleRepository: Send + Sync {
    async fn record_sale(&self, sale: &Sale) -> Result<(), RepositoryError>;

    /// Most recent sales first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<Sale>, RepositoryError>;
}
