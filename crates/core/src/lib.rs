pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod inventory;
pub mod pos;
pub mod pricing;
pub mod rules;

pub use catalog::{generate_products, summarize, VariationModel};
pub use domain::dataset::{parse_records, DatasetRecord, DatasetSummary};
pub use domain::product::{Product, ProductAlerts, ProductId};
pub use domain::rule::{
    AlertType, ComparisonOperator, PricingRule, RuleCondition, RuleId, RuleParameter,
};
pub use domain::sale::{Sale, SaleId, SaleLine};
pub use errors::{ApplicationError, DomainError, FailureKind, InterfaceError};
pub use inventory::{DashboardSettings, InventoryDashboard, RefreshOutcome};
pub use pos::{Cart, CartLine, CartTotals};
pub use pricing::{apply_pricing_rules, DeterministicPricingEngine, PricingEngine};
pub use rules::{default_rules, RuleStore};
