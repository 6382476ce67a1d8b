use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::errors::DomainError;

pub const DEFAULT_STOCK: u32 = 50;
pub const DEFAULT_DAYS_TO_EXPIRY: f64 = 7.0;
pub const DEFAULT_ORIGINAL_PRICE: f64 = 10.0;
pub const DEFAULT_SALES_VELOCITY: f64 = 10.0;

/// One validated row of an uploaded inventory dataset.
///
/// Numeric fields are already coerced by the upstream parser; absent values
/// fall back to the dashboard defaults when products are generated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRecord {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub days_to_expiry: Option<f64>,
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub sales_velocity: Option<f64>,
}

impl DatasetRecord {
    pub fn stock_or_default(&self) -> u32 {
        self.stock.unwrap_or(DEFAULT_STOCK)
    }

    pub fn days_to_expiry_or_default(&self) -> f64 {
        self.days_to_expiry.unwrap_or(DEFAULT_DAYS_TO_EXPIRY)
    }

    pub fn original_price_or_default(&self) -> f64 {
        self.original_price.unwrap_or(DEFAULT_ORIGINAL_PRICE)
    }

    pub fn current_price_or_default(&self) -> f64 {
        self.current_price.unwrap_or_else(|| self.original_price_or_default())
    }

    pub fn sales_velocity_or_default(&self) -> f64 {
        self.sales_velocity.unwrap_or(DEFAULT_SALES_VELOCITY)
    }

    pub fn store_or_default(&self) -> &str {
        self.store.as_deref().filter(|value| !value.trim().is_empty()).unwrap_or("Unknown Store")
    }

    pub fn category_or_default(&self) -> &str {
        self.category
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or("Unknown Category")
    }
}

/// Decodes a JSON array of dataset records.
pub fn parse_records(raw: &str) -> Result<Vec<DatasetRecord>, DomainError> {
    serde_json::from_str(raw)
        .map_err(|error| DomainError::InvalidDataset(format!("dataset is not valid JSON: {error}")))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub total_items: usize,
    pub near_expiry: usize,
    pub average_shelf_life: f64,
    pub categories: Vec<String>,
    pub stores: Vec<String>,
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub store_count: usize,
    pub category_count: usize,
}

#[cfg(test)]
mod tests {
    use super::{parse_records, DEFAULT_STOCK};

    #[test]
    fn missing_numeric_fields_fall_back_to_defaults() {
        let records = parse_records(
            r#"[{ "id": "item-1", "name": "Milk", "originalPrice": 4.5 }]"#,
        )
        .expect("parse dataset");

        let record = &records[0];
        assert_eq!(record.stock_or_default(), DEFAULT_STOCK);
        assert_eq!(record.days_to_expiry_or_default(), 7.0);
        assert_eq!(record.current_price_or_default(), 4.5);
        assert_eq!(record.store_or_default(), "Unknown Store");
        assert_eq!(record.category_or_default(), "Unknown Category");
    }

    #[test]
    fn malformed_dataset_is_rejected() {
        let error = parse_records("{ not json").expect_err("should fail");
        assert!(error.to_string().contains("dataset"));
    }
}
