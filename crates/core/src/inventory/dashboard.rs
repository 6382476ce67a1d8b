use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{generate_products, summarize, VariationModel};
use crate::domain::{
    dataset::{DatasetRecord, DatasetSummary},
    product::Product,
    rule::{PricingRule, RuleId},
    sale::Sale,
};
use crate::errors::DomainError;
use crate::pos::{apply_sale_to_dataset, Cart, DEFAULT_TAX_RATE_PCT};
use crate::pricing::{DeterministicPricingEngine, PricingEngine};
use crate::rules::RuleStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RefreshOutcome {
    Skipped,
    Repriced { product_count: usize, alert_count: usize },
}

#[derive(Clone, Debug)]
pub struct DashboardSettings {
    pub variation: VariationModel,
    pub tax_rate_pct: Decimal,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self { variation: VariationModel::default(), tax_rate_pct: DEFAULT_TAX_RATE_PCT }
    }
}

/// Owns the raw dataset, the rule list and the last priced product list.
///
/// Every mutation ends in a full repricing pass over the raw dataset; nothing
/// is updated incrementally. Callers serialise access and supply the clock.
pub struct InventoryDashboard<P = DeterministicPricingEngine> {
    engine: P,
    settings: DashboardSettings,
    dataset: Vec<DatasetRecord>,
    rules: RuleStore,
    products: Vec<Product>,
    sales: Vec<Sale>,
    last_update: Option<DateTime<Utc>>,
}

impl Default for InventoryDashboard<DeterministicPricingEngine> {
    fn default() -> Self {
        Self::new(DeterministicPricingEngine, RuleStore::with_default_rules(), DashboardSettings::default())
    }
}

impl<P: PricingEngine> InventoryDashboard<P> {
    pub fn new(engine: P, rules: RuleStore, settings: DashboardSettings) -> Self {
        Self {
            engine,
            settings,
            dataset: Vec::new(),
            rules,
            products: Vec::new(),
            sales: Vec::new(),
            last_update: None,
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn rules(&self) -> &[PricingRule] {
        self.rules.rules()
    }

    pub fn dataset(&self) -> &[DatasetRecord] {
        &self.dataset
    }

    /// Most recent sale first.
    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn summary(&self) -> Option<DatasetSummary> {
        summarize(&self.dataset)
    }

    pub fn load_dataset(
        &mut self,
        records: Vec<DatasetRecord>,
        now: DateTime<Utc>,
    ) -> Option<DatasetSummary> {
        info!(
            event_name = "inventory.dataset.loaded",
            record_count = records.len(),
            "dataset loaded"
        );
        self.dataset = records;
        if self.dataset.is_empty() {
            self.products.clear();
            self.last_update = None;
        }
        self.refresh(now);
        self.summary()
    }

    /// Regenerates every product from the raw dataset and the current rules.
    /// A no-op while no dataset is loaded.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> RefreshOutcome {
        if self.dataset.is_empty() {
            debug!(event_name = "inventory.refresh.skipped", "refresh skipped: no dataset loaded");
            return RefreshOutcome::Skipped;
        }

        let rules = self.rules.snapshot();
        self.products =
            generate_products(&self.engine, &self.dataset, &rules, self.settings.variation, now);
        self.last_update = Some(now);

        let alert_count = self.products.iter().filter(|product| product.alerts.any()).count();
        debug!(
            event_name = "inventory.refresh.repriced",
            product_count = self.products.len(),
            alert_count,
            rule_count = rules.len(),
            "pricing pass completed"
        );
        RefreshOutcome::Repriced { product_count: self.products.len(), alert_count }
    }

    pub fn add_rule(&mut self, rule: PricingRule, now: DateTime<Utc>) -> Result<RuleId, DomainError> {
        let id = self.rules.add(rule)?;
        self.refresh(now);
        Ok(id)
    }

    pub fn update_rule(&mut self, rule: PricingRule, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.rules.update(rule)?;
        self.refresh(now);
        Ok(())
    }

    pub fn delete_rule(&mut self, id: &RuleId, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.rules.delete(id)?;
        self.refresh(now);
        Ok(())
    }

    pub fn set_rule_active(
        &mut self,
        id: &RuleId,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.rules.set_active(id, is_active)?;
        self.refresh(now);
        Ok(())
    }

    pub fn move_rule_up(&mut self, index: usize, now: DateTime<Utc>) -> bool {
        let moved = self.rules.move_up(index);
        if moved {
            self.refresh(now);
        }
        moved
    }

    pub fn move_rule_down(&mut self, index: usize, now: DateTime<Utc>) -> bool {
        let moved = self.rules.move_down(index);
        if moved {
            self.refresh(now);
        }
        moved
    }

    /// Swaps in an edited rule list wholesale, as the settings screen saves it.
    pub fn replace_rules(
        &mut self,
        rules: Vec<PricingRule>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.rules = RuleStore::from_rules(rules)?;
        self.refresh(now);
        Ok(())
    }

    /// Records the sale, takes the sold units out of the raw dataset and
    /// reprices. Every cart line must still name a record of the loaded
    /// dataset; a cart built before the dataset was swapped is refused whole.
    pub fn checkout(&mut self, cart: &Cart, now: DateTime<Utc>) -> Result<Sale, DomainError> {
        let sale = cart.checkout(self.settings.tax_rate_pct, now)?;
        if let Some(line) = sale
            .lines
            .iter()
            .find(|line| !self.dataset.iter().any(|record| record.id == line.product_id))
        {
            return Err(DomainError::InvariantViolation(format!(
                "cart line `{}` is not in the loaded dataset",
                line.product_id
            )));
        }
        apply_sale_to_dataset(&mut self.dataset, &sale);
        info!(
            event_name = "inventory.sale.recorded",
            sale_id = %sale.id.0,
            units = sale.units_sold(),
            total = %sale.total,
            "sale recorded"
        );
        self.sales.insert(0, sale.clone());
        self.refresh(now);
        Ok(sale)
    }
}
