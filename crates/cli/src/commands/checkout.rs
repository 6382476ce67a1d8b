use std::path::Path;

use chrono::Utc;
use freshprice_core::catalog::VariationModel;
use freshprice_core::domain::{dataset::DatasetRecord, product::ProductId, sale::Sale};
use freshprice_core::errors::{ApplicationError, DomainError};
use freshprice_core::inventory::{DashboardSettings, InventoryDashboard};
use freshprice_core::pos::Cart;
use freshprice_core::pricing::DeterministicPricingEngine;
use freshprice_db::load_or_seed_rules;
use serde::Serialize;

use crate::commands::inputs::{describe, read_cart, read_dataset, CartEntry};
use crate::commands::storage::{load_config, runtime, Failure, Storage};
use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct CheckoutReport {
    command: &'static str,
    status: &'static str,
    persisted: bool,
    sale: Sale,
    remaining: Vec<RemainingStock>,
}

#[derive(Debug, Serialize)]
struct RemainingStock {
    id: ProductId,
    stock: u32,
    current_price: f64,
}

/// Prices the dataset with the stored rules, checks the cart out at those
/// prices and records the sale. `dry_run` keeps the sale in memory.
pub fn run(dataset_path: &Path, cart_path: &Path, dry_run: bool) -> CommandResult {
    let records = match read_dataset(dataset_path) {
        Ok(records) => records,
        Err(error) => {
            return CommandResult::failure("checkout", "invalid_dataset", describe(&error), 2)
        }
    };
    let entries = match read_cart(cart_path) {
        Ok(entries) => entries,
        Err(error) => return CommandResult::failure("checkout", "invalid_cart", describe(&error), 2),
    };

    match check_out(records, &entries, dry_run) {
        Ok(report) => CommandResult::report("checkout", &report),
        Err(failure) => failure.into_result("checkout"),
    }
}

fn check_out(
    records: Vec<DatasetRecord>,
    entries: &[CartEntry],
    dry_run: bool,
) -> Result<CheckoutReport, Failure> {
    let config = load_config()?;
    let settings = DashboardSettings {
        variation: VariationModel::None,
        tax_rate_pct: config.pricing.tax_rate_pct,
    };

    runtime()?.block_on(async {
        let storage = Storage::open_or_in_memory((!dry_run).then_some(&config)).await?;
        let outcome = record(&storage, settings, records, entries).await;
        storage.close().await;
        outcome
    })
}

async fn record(
    storage: &Storage,
    settings: DashboardSettings,
    records: Vec<DatasetRecord>,
    entries: &[CartEntry],
) -> Result<CheckoutReport, Failure> {
    let rules = load_or_seed_rules(&*storage.rules).await.map_err(ApplicationError::from)?;
    let mut dashboard = InventoryDashboard::new(DeterministicPricingEngine, rules, settings);
    dashboard.load_dataset(records, Utc::now());

    let cart = fill_cart(&dashboard, entries).map_err(ApplicationError::from)?;
    let sale = dashboard.checkout(&cart, Utc::now()).map_err(ApplicationError::from)?;
    storage.sales.record_sale(&sale).await.map_err(ApplicationError::from)?;

    let remaining = dashboard
        .products()
        .iter()
        .filter(|product| sale.quantity_for(&product.id) > 0)
        .map(|product| RemainingStock {
            id: product.id.clone(),
            stock: product.stock,
            current_price: product.current_price,
        })
        .collect();

    Ok(CheckoutReport {
        command: "checkout",
        status: "ok",
        persisted: storage.is_persistent(),
        sale,
        remaining,
    })
}

/// Adds each entry at the product's current price. Repeated ids accumulate
/// on one line.
fn fill_cart(
    dashboard: &InventoryDashboard<DeterministicPricingEngine>,
    entries: &[CartEntry],
) -> Result<Cart, DomainError> {
    let mut cart = Cart::new();
    for entry in entries {
        let product = dashboard
            .products()
            .iter()
            .find(|product| product.id == entry.product_id)
            .ok_or_else(|| DomainError::ProductNotFound(entry.product_id.clone()))?;
        let held = cart
            .lines()
            .iter()
            .find(|line| line.product_id == entry.product_id)
            .map_or(0, |line| line.quantity);
        cart.add(product);
        cart.update_quantity(&entry.product_id, held.saturating_add(entry.quantity))?;
    }
    Ok(cart)
}
