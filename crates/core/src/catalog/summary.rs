use crate::domain::dataset::{DatasetRecord, DatasetSummary};

pub const NEAR_EXPIRY_DAYS: f64 = 2.0;

/// Aggregate view of an uploaded dataset. `None` for an empty dataset.
pub fn summarize(records: &[DatasetRecord]) -> Option<DatasetSummary> {
    if records.is_empty() {
        return None;
    }

    let count = records.len() as f64;
    let near_expiry = records
        .iter()
        .filter(|record| record.days_to_expiry_or_default() <= NEAR_EXPIRY_DAYS)
        .count();
    let average_shelf_life =
        records.iter().map(DatasetRecord::days_to_expiry_or_default).sum::<f64>() / count;

    let prices: Vec<f64> = records.iter().map(DatasetRecord::original_price_or_default).collect();
    let average_price = prices.iter().sum::<f64>() / count;
    let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let categories = distinct(records.iter().map(DatasetRecord::category_or_default));
    let stores = distinct(records.iter().map(DatasetRecord::store_or_default));

    Some(DatasetSummary {
        total_items: records.len(),
        near_expiry,
        average_shelf_life,
        category_count: categories.len(),
        store_count: stores.len(),
        categories,
        stores,
        average_price,
        min_price,
        max_price,
    })
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        if !seen.iter().any(|existing| existing == value) {
            seen.push(value.to_string());
        }
    }
    seen
}
