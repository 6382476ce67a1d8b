use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use freshprice_core::domain::product::Product;
use freshprice_core::domain::rule::PricingRule;
use freshprice_core::domain::sale::Sale;

use super::{ProductSnapshotRepository, RepositoryError, RuleRepository, SaleRepository};

#[derive(Default)]
pub struct InMemoryProductSnapshotRepository {
    products: RwLock<HashMap<String, Product>>,
}

#[async_trait::async_trait]
impl ProductSnapshotRepository for InMemoryProductSnapshotRepository {
    async fn upsert_all(
        &self,
        products: &[Product],
        _priced_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        let mut stored = self.products.write().await;
        for product in products {
            stored.insert(product.id.0.clone(), product.clone());
        }
        Ok(products.len())
    }

    async fn list_by_expiry(&self) -> Result<Vec<Product>, RepositoryError> {
        let stored = self.products.read().await;
        let mut products: Vec<Product> = stored.values().cloned().collect();
        products.sort_by(|a, b| {
            a.days_to_expiry.total_cmp(&b.days_to_expiry).then_with(|| a.id.0.cmp(&b.id.0))
        });
        Ok(products)
    }
}

#[derive(Default)]
pub struct InMemoryRuleRepository {
    rules: RwLock<Vec<PricingRule>>,
}

#[async_trait::async_trait]
impl RuleRepository for InMemoryRuleRepository {
    async fn list_ordered(&self) -> Result<Vec<PricingRule>, RepositoryError> {
        let mut rules = self.rules.read().await.clone();
        rules.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(rules)
    }

    async fn replace_all(&self, rules: &[PricingRule]) -> Result<(), RepositoryError> {
        *self.rules.write().await = rules.to_vec();
        Ok(())
    }
}

/// Keeps sales only; it has no snapshot table to decrement.
#[derive(Default)]
pub struct InMemorySaleRepository {
    sales: RwLock<Vec<Sale>>,
}

#[async_trait::async_trait]
impl SaleRepository for InMemorySaleRepository {
    async fn record_sale(&self, sale: &Sale) -> Result<(), RepositoryError> {
        self.sales.write().await.push(sale.clone());
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Sale>, RepositoryError> {
        let sales = self.sales.read().await;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(sales.iter().rev().take(limit).cloned().collect())
    }
}
