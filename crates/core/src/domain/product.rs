use serde::{Deserialize, Serialize};

use crate::domain::rule::{AlertType, RuleId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAlerts {
    pub expiry: bool,
    pub stock: bool,
    pub sales_velocity: bool,
    pub other: bool,
}

impl ProductAlerts {
    pub fn raise(&mut self, alert_type: AlertType) {
        match alert_type {
            AlertType::Expiry => self.expiry = true,
            AlertType::Stock => self.stock = true,
            AlertType::SalesVelocity => self.sales_velocity = true,
            AlertType::Other => self.other = true,
        }
    }

    pub fn is_raised(&self, alert_type: AlertType) -> bool {
        match alert_type {
            AlertType::Expiry => self.expiry,
            AlertType::Stock => self.stock,
            AlertType::SalesVelocity => self.sales_velocity,
            AlertType::Other => self.other,
        }
    }

    pub fn any(&self) -> bool {
        self.expiry || self.stock || self.sales_velocity || self.other
    }
}

/// A priced, perishable inventory item.
///
/// `current_price`, `discount`, `alerts` and `matched_rules` are outputs of the
/// last pricing pass; they are recomputed from scratch on every pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub store: String,
    pub category: String,
    pub stock: u32,
    pub days_to_expiry: f64,
    pub original_price: f64,
    pub current_price: f64,
    pub discount: f64,
    pub sales_velocity: f64,
    pub alerts: ProductAlerts,
    pub matched_rules: Vec<RuleId>,
}

#[cfg(test)]
mod tests {
    use super::ProductAlerts;
    use crate::domain::rule::AlertType;

    #[test]
    fn raising_an_alert_is_idempotent_and_independent() {
        let mut alerts = ProductAlerts::default();
        assert!(!alerts.any());

        alerts.raise(AlertType::Stock);
        alerts.raise(AlertType::Stock);

        assert!(alerts.is_raised(AlertType::Stock));
        assert!(!alerts.is_raised(AlertType::Expiry));
        assert!(!alerts.is_raised(AlertType::SalesVelocity));
        assert!(!alerts.is_raised(AlertType::Other));
        assert!(alerts.any());
    }
}
