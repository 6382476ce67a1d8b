//! Point-of-sale cart arithmetic against the current rule-adjusted prices.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::{
    dataset::DatasetRecord,
    product::{Product, ProductId},
    sale::{Sale, SaleId, SaleLine},
};
use crate::errors::DomainError;

pub const DEFAULT_TAX_RATE_PCT: Decimal = Decimal::from_parts(8, 0, 0, false, 0);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub original_price: f64,
    pub discount_pct: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Adds one unit at the product's current price, or bumps the quantity of
    /// an existing line. The price captured on first add is kept.
    pub fn add(&mut self, product: &Product) {
        if let Some(line) = self.lines.iter_mut().find(|line| line.product_id == product.id) {
            line.quantity = line.quantity.saturating_add(1);
            return;
        }

        self.lines.push(CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            quantity: 1,
            unit_price: product.current_price,
            original_price: product.original_price,
            discount_pct: product.discount,
        });
    }

    /// Sets a line's quantity; zero removes the line.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), DomainError> {
        let index = self
            .lines
            .iter()
            .position(|line| &line.product_id == product_id)
            .ok_or_else(|| DomainError::ProductNotFound(product_id.clone()))?;

        if quantity == 0 {
            self.lines.remove(index);
        } else {
            self.lines[index].quantity = quantity;
        }
        Ok(())
    }

    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn totals(&self, tax_rate_pct: Decimal) -> CartTotals {
        let subtotal = self.lines.iter().map(line_subtotal).sum::<Decimal>();
        totals_for(subtotal, tax_rate_pct)
    }

    pub fn checkout(&self, tax_rate_pct: Decimal, now: DateTime<Utc>) -> Result<Sale, DomainError> {
        if self.lines.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let lines: Vec<SaleLine> = self
            .lines
            .iter()
            .map(|line| SaleLine {
                product_id: line.product_id.clone(),
                product_name: line.name.clone(),
                quantity: line.quantity,
                unit_price: money(line.unit_price),
                original_price: money(line.original_price),
                discount_pct: money(line.discount_pct),
                subtotal: line_subtotal(line),
            })
            .collect();
        let totals = self.totals(tax_rate_pct);

        Ok(Sale {
            id: SaleId::generate(),
            sold_at: now,
            lines,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
        })
    }
}

fn line_subtotal(line: &CartLine) -> Decimal {
    round_cents(money(line.unit_price) * Decimal::from(line.quantity))
}

fn totals_for(subtotal: Decimal, tax_rate_pct: Decimal) -> CartTotals {
    let subtotal = round_cents(subtotal);
    let tax = round_cents(subtotal * tax_rate_pct / Decimal::ONE_HUNDRED);
    CartTotals { subtotal, tax, total: subtotal + tax }
}

/// Converts an engine price to cents. Non-finite prices become zero.
pub fn money(value: f64) -> Decimal {
    Decimal::try_from(value).map(round_cents).unwrap_or(Decimal::ZERO)
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Removes sold units from the raw dataset, never dropping below zero.
pub fn apply_sale_to_dataset(records: &mut [DatasetRecord], sale: &Sale) {
    for record in records.iter_mut() {
        let sold = sale.quantity_for(&record.id);
        if sold > 0 {
            record.stock = Some(record.stock_or_default().saturating_sub(sold));
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{apply_sale_to_dataset, money, Cart, DEFAULT_TAX_RATE_PCT};
    use crate::domain::{
        dataset::DatasetRecord,
        product::{Product, ProductAlerts, ProductId},
    };
    use crate::errors::DomainError;

    fn product(id: &str, current_price: f64) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: format!("Product {id}"),
            store: "Main".to_string(),
            category: "Deli".to_string(),
            stock: 5,
            days_to_expiry: 2.0,
            original_price: 10.0,
            current_price,
            discount: (10.0 - current_price) * 10.0,
            sales_velocity: 8.0,
            alerts: ProductAlerts::default(),
            matched_rules: Vec::new(),
        }
    }

    #[test]
    fn default_tax_rate_is_eight_percent() {
        assert_eq!(DEFAULT_TAX_RATE_PCT, Decimal::new(8, 0));
    }

    #[test]
    fn adding_twice_increments_one_line() {
        let mut cart = Cart::new();
        let item = product("a", 7.5);
        cart.add(&item);
        cart.add(&item);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn totals_apply_tax_and_round_to_cents() {
        let mut cart = Cart::new();
        cart.add(&product("a", 7.5));
        cart.add(&product("a", 7.5));
        cart.add(&product("b", 3.33));

        let totals = cart.totals(DEFAULT_TAX_RATE_PCT);

        assert_eq!(totals.subtotal, Decimal::new(1833, 2));
        assert_eq!(totals.tax, Decimal::new(147, 2));
        assert_eq!(totals.total, Decimal::new(1980, 2));
    }

    #[test]
    fn zero_quantity_removes_the_line_and_unknown_items_error() {
        let mut cart = Cart::new();
        cart.add(&product("a", 5.0));

        cart.update_quantity(&ProductId("a".to_string()), 4).expect("update");
        assert_eq!(cart.item_count(), 4);

        cart.update_quantity(&ProductId("a".to_string()), 0).expect("remove");
        assert!(cart.is_empty());

        let error = cart.update_quantity(&ProductId("ghost".to_string()), 1).expect_err("missing");
        assert!(matches!(error, DomainError::ProductNotFound(_)));
    }

    #[test]
    fn empty_cart_cannot_check_out() {
        let error = Cart::new().checkout(DEFAULT_TAX_RATE_PCT, Utc::now()).expect_err("empty");
        assert_eq!(error, DomainError::EmptyCart);
    }

    #[test]
    fn checkout_records_line_prices_and_totals() {
        let mut cart = Cart::new();
        cart.add(&product("a", 4.0));
        cart.update_quantity(&ProductId("a".to_string()), 3).expect("qty");

        let sale = cart.checkout(DEFAULT_TAX_RATE_PCT, Utc::now()).expect("checkout");

        assert!(sale.id.0.starts_with("sale-"));
        assert_eq!(sale.lines[0].subtotal, Decimal::new(1200, 2));
        assert_eq!(sale.lines[0].discount_pct, Decimal::new(6000, 2));
        assert_eq!(sale.subtotal, Decimal::new(1200, 2));
        assert_eq!(sale.tax, Decimal::new(96, 2));
        assert_eq!(sale.total, Decimal::new(1296, 2));
        assert_eq!(sale.units_sold(), 3);
    }

    #[test]
    fn sale_decrements_dataset_stock_saturating_at_zero() {
        let mut records = vec![
            DatasetRecord {
                id: ProductId("a".to_string()),
                name: "A".to_string(),
                store: None,
                category: None,
                stock: Some(2),
                days_to_expiry: None,
                original_price: None,
                current_price: None,
                sales_velocity: None,
            },
            DatasetRecord {
                id: ProductId("b".to_string()),
                name: "B".to_string(),
                store: None,
                category: None,
                stock: Some(9),
                days_to_expiry: None,
                original_price: None,
                current_price: None,
                sales_velocity: None,
            },
        ];
        let mut cart = Cart::new();
        cart.add(&product("a", 5.0));
        cart.update_quantity(&ProductId("a".to_string()), 5).expect("qty");
        let sale = cart.checkout(DEFAULT_TAX_RATE_PCT, Utc::now()).expect("checkout");

        apply_sale_to_dataset(&mut records, &sale);

        assert_eq!(records[0].stock, Some(0));
        assert_eq!(records[1].stock, Some(9));
    }

    #[test]
    fn non_finite_prices_become_zero_money() {
        assert_eq!(money(f64::NAN), Decimal::ZERO);
        assert_eq!(money(f64::INFINITY), Decimal::ZERO);
        assert_eq!(money(7.5), Decimal::new(750, 2));
    }
}
