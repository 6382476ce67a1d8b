use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    dataset::DatasetRecord,
    product::{Product, ProductAlerts},
    rule::PricingRule,
};
use crate::pricing::PricingEngine;

pub const DEFAULT_VARIATION_AMPLITUDE: f64 = 0.1;
pub const DEFAULT_VARIATION_PERIOD_MS: f64 = 100_000.0;
const MIN_SALES_VELOCITY: f64 = 0.1;

/// Real-time drift applied to stock, expiry and velocity when products are
/// regenerated from the raw dataset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum VariationModel {
    None,
    Simulated { amplitude: f64, period_ms: f64 },
}

impl Default for VariationModel {
    fn default() -> Self {
        Self::Simulated {
            amplitude: DEFAULT_VARIATION_AMPLITUDE,
            period_ms: DEFAULT_VARIATION_PERIOD_MS,
        }
    }
}

impl VariationModel {
    /// Multiplier for the record at `index`, or `None` when no drift applies.
    pub fn factor(&self, index: usize, now: DateTime<Utc>) -> Option<f64> {
        match *self {
            Self::None => None,
            Self::Simulated { amplitude, period_ms } => {
                let phase = now.timestamp_millis() as f64 / period_ms + index as f64;
                Some(phase.sin() * amplitude + 1.0)
            }
        }
    }
}

/// Percentage the record's shelf price already sits below its original price.
pub fn initial_discount(original_price: f64, current_price: f64) -> f64 {
    if original_price > 0.0 && current_price < original_price {
        (original_price - current_price) / original_price * 100.0
    } else {
        0.0
    }
}

/// Builds the unpriced product for one dataset row.
pub fn base_product(
    record: &DatasetRecord,
    index: usize,
    variation: VariationModel,
    now: DateTime<Utc>,
) -> Product {
    let stock = record.stock_or_default();
    let days_to_expiry = record.days_to_expiry_or_default();
    let sales_velocity = record.sales_velocity_or_default();

    let (stock, days_to_expiry, sales_velocity) = match variation.factor(index, now) {
        Some(factor) => (
            vary_stock(stock, factor),
            (days_to_expiry * factor).floor().max(1.0),
            (sales_velocity * factor).max(MIN_SALES_VELOCITY),
        ),
        None => (stock, days_to_expiry, sales_velocity),
    };

    let original_price = record.original_price_or_default();
    let current_price = record.current_price_or_default();

    Product {
        id: record.id.clone(),
        name: record.name.clone(),
        store: record.store_or_default().to_string(),
        category: record.category_or_default().to_string(),
        stock,
        days_to_expiry,
        original_price,
        current_price,
        discount: initial_discount(original_price, current_price),
        sales_velocity,
        alerts: ProductAlerts::default(),
        matched_rules: Vec::new(),
    }
}

fn vary_stock(stock: u32, factor: f64) -> u32 {
    let varied = (f64::from(stock) * factor).floor().max(1.0);
    if varied >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        varied as u32
    }
}

/// Regenerates the whole product list from the raw dataset and prices it.
pub fn generate_products<P: PricingEngine + ?Sized>(
    engine: &P,
    records: &[DatasetRecord],
    rules: &[PricingRule],
    variation: VariationModel,
    now: DateTime<Utc>,
) -> Vec<Product> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| engine.price(&base_product(record, index, variation, now), rules))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{base_product, generate_products, initial_discount, VariationModel};
    use crate::domain::{dataset::DatasetRecord, product::ProductId};
    use crate::pricing::DeterministicPricingEngine;
    use crate::rules::default_rules;

    fn record(stock: u32, days: f64, velocity: f64) -> DatasetRecord {
        DatasetRecord {
            id: ProductId("item-1".to_string()),
            name: "Sourdough".to_string(),
            store: Some("Harbor".to_string()),
            category: Some("Bakery".to_string()),
            stock: Some(stock),
            days_to_expiry: Some(days),
            original_price: Some(6.0),
            current_price: Some(4.5),
            sales_velocity: Some(velocity),
        }
    }

    #[test]
    fn initial_discount_only_counts_markdowns() {
        assert_eq!(initial_discount(6.0, 4.5), 25.0);
        assert_eq!(initial_discount(6.0, 7.0), 0.0);
        assert_eq!(initial_discount(0.0, 0.0), 0.0);
    }

    #[test]
    fn without_variation_fields_pass_through() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid time");
        let product = base_product(&record(80, 2.5, 4.0), 0, VariationModel::None, now);

        assert_eq!(product.stock, 80);
        assert_eq!(product.days_to_expiry, 2.5);
        assert_eq!(product.sales_velocity, 4.0);
        assert_eq!(product.discount, 25.0);
        assert_eq!(product.store, "Harbor");
    }

    #[test]
    fn simulated_variation_stays_within_amplitude_and_floors() {
        let model = VariationModel::default();
        for minute in 0..30 {
            let now = Utc.timestamp_millis_opt(minute * 60_000).single().expect("valid time");
            for index in 0..5 {
                let factor = model.factor(index, now).expect("simulated factor");
                assert!((0.9..=1.1).contains(&factor), "factor {factor} out of range");

                let product = base_product(&record(100, 10.0, 20.0), index, model, now);
                assert!((90..=110).contains(&product.stock));
                assert!(product.days_to_expiry >= 9.0 && product.days_to_expiry <= 11.0);
                assert_eq!(product.days_to_expiry, product.days_to_expiry.floor());
            }
        }
    }

    #[test]
    fn simulated_variation_respects_minimums() {
        let now = Utc.timestamp_millis_opt(0).single().expect("valid time");
        let product = base_product(&record(0, 0.0, 0.0), 3, VariationModel::default(), now);

        assert_eq!(product.stock, 1);
        assert_eq!(product.days_to_expiry, 1.0);
        assert_eq!(product.sales_velocity, 0.1);
    }

    #[test]
    fn generated_products_are_priced_in_dataset_order() {
        let now = Utc.timestamp_millis_opt(0).single().expect("valid time");
        let mut second = record(200, 9.0, 30.0);
        second.id = ProductId("item-2".to_string());

        let products = generate_products(
            &DeterministicPricingEngine,
            &[record(10, 1.0, 3.0), second],
            &default_rules(),
            VariationModel::None,
            now,
        );

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id.0, "item-1");
        // critical expiry + near expiry + low demand
        assert_eq!(products[0].discount, 85.0);
        assert!(products[0].alerts.expiry && products[0].alerts.sales_velocity);
        assert_eq!(products[1].discount, 15.0);
        assert!(products[1].alerts.stock);
    }
}
