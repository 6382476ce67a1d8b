use std::path::Path;

use chrono::Utc;
use freshprice_core::catalog::VariationModel;
use freshprice_core::domain::{dataset::DatasetSummary, product::Product};
use freshprice_core::inventory::{DashboardSettings, InventoryDashboard};
use freshprice_core::pricing::DeterministicPricingEngine;
use serde::Serialize;

use crate::commands::inputs::{describe, read_dataset, read_rules};
use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct PriceReport<'a> {
    command: &'static str,
    status: &'static str,
    product_count: usize,
    alert_count: usize,
    rule_count: usize,
    summary: Option<DatasetSummary>,
    products: &'a [Product],
}

/// Prices the dataset once with simulation switched off, so repeated runs over
/// the same files print the same document.
pub fn run(dataset_path: &Path, rules_path: Option<&Path>) -> CommandResult {
    let records = match read_dataset(dataset_path) {
        Ok(records) => records,
        Err(error) => return CommandResult::failure("price", "invalid_dataset", describe(&error), 2),
    };
    let rules = match read_rules(rules_path) {
        Ok(rules) => rules,
        Err(error) => return CommandResult::failure("price", "invalid_rules", describe(&error), 2),
    };

    let rule_count = rules.len();
    let settings = DashboardSettings { variation: VariationModel::None, ..DashboardSettings::default() };
    let mut dashboard = InventoryDashboard::new(DeterministicPricingEngine, rules, settings);
    let summary = dashboard.load_dataset(records, Utc::now());

    let products = dashboard.products();
    let alert_count = products.iter().filter(|product| product.alerts.any()).count();

    CommandResult::report(
        "price",
        &PriceReport {
            command: "price",
            status: "ok",
            product_count: products.len(),
            alert_count,
            rule_count,
            summary,
            products,
        },
    )
}
