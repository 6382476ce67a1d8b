use crate::domain::{
    product::{Product, ProductAlerts},
    rule::PricingRule,
};
use crate::pricing::evaluator::evaluate_rule;

pub trait PricingEngine: Send + Sync {
    fn price(&self, product: &Product, rules: &[PricingRule]) -> Product;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicPricingEngine;

impl PricingEngine for DeterministicPricingEngine {
    fn price(&self, product: &Product, rules: &[PricingRule]) -> Product {
        apply_pricing_rules(product, rules)
    }
}

/// Prices one product against a point-in-time rule snapshot.
///
/// Rules run in ascending priority (stable for equal priorities). Every active
/// rule whose conditions hold adds its discount, records its id and raises its
/// alert. The summed discount is not clamped, so stacking past 100% yields a
/// negative price. Conditions read the product as supplied.
pub fn apply_pricing_rules(product: &Product, rules: &[PricingRule]) -> Product {
    let mut ordered: Vec<&PricingRule> = rules.iter().collect();
    ordered.sort_by_key(|rule| rule.priority);

    let mut priced = Product {
        alerts: ProductAlerts::default(),
        matched_rules: Vec::new(),
        ..product.clone()
    };
    let mut total_discount = 0.0;

    for rule in ordered {
        if !rule.is_active {
            continue;
        }
        if evaluate_rule(rule, product) {
            priced.matched_rules.push(rule.id.clone());
            total_discount += rule.discount;
            priced.alerts.raise(rule.alert_type);
        }
    }

    priced.discount = total_discount;
    priced.current_price = product.original_price * (1.0 - total_discount / 100.0);
    priced
}

pub fn apply_pricing_rules_to_all(products: &[Product], rules: &[PricingRule]) -> Vec<Product> {
    products.iter().map(|product| apply_pricing_rules(product, rules)).collect()
}
