use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaleId(pub String);

impl SaleId {
    pub fn generate() -> Self {
        Self(format!("sale-{}", uuid::Uuid::new_v4()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub original_price: Decimal,
    pub discount_pct: Decimal,
    pub subtotal: Decimal,
}

/// A completed point-of-sale transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub sold_at: DateTime<Utc>,
    pub lines: Vec<SaleLine>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Sale {
    pub fn units_sold(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn quantity_for(&self, product_id: &ProductId) -> u32 {
        self.lines
            .iter()
            .filter(|line| &line.product_id == product_id)
            .map(|line| line.quantity)
            .sum()
    }
}
