use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use freshprice_core::domain::dataset::{parse_records, DatasetRecord};
use freshprice_core::domain::product::ProductId;
use freshprice_core::domain::rule::PricingRule;
use freshprice_core::rules::RuleStore;
use serde::Deserialize;

/// One line of a cart file: `{"productId": "...", "quantity": 2}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Reads a dataset file. The error chain names the file.
pub fn read_dataset(path: &Path) -> Result<Vec<DatasetRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read dataset `{}`", path.display()))?;
    parse_records(&raw).with_context(|| format!("dataset `{}` was rejected", path.display()))
}

/// Loads rules from `path`, or the built-in set when no path is given, and
/// normalises their priorities.
pub fn read_rules(path: Option<&Path>) -> Result<RuleStore> {
    let Some(path) = path else {
        return Ok(RuleStore::with_default_rules());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read rules `{}`", path.display()))?;
    let rules: Vec<PricingRule> = serde_json::from_str(&raw)
        .with_context(|| format!("rules `{}` are not a JSON array of pricing rules", path.display()))?;
    RuleStore::from_rules(rules)
        .with_context(|| format!("rules `{}` were rejected", path.display()))
}

pub fn read_cart(path: &Path) -> Result<Vec<CartEntry>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read cart `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("cart `{}` is not a JSON array of cart lines", path.display()))
}

/// Reads a single rule object, as the rule editor submits it.
pub fn read_rule(path: &Path) -> Result<PricingRule> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read rule `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("rule `{}` is not a pricing rule object", path.display()))
}

/// Flattens an error chain into one line for command output.
pub fn describe(error: &anyhow::Error) -> String {
    format!("{error:#}")
}
