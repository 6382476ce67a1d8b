use crate::domain::{
    product::Product,
    rule::{ComparisonOperator, PricingRule, RuleCondition, RuleParameter},
};

fn parameter_value(parameter: RuleParameter, product: &Product) -> Option<f64> {
    match parameter {
        RuleParameter::DaysToExpiry => Some(product.days_to_expiry),
        RuleParameter::Stock => Some(f64::from(product.stock)),
        RuleParameter::SalesVelocity => Some(product.sales_velocity),
        RuleParameter::OriginalPrice => Some(product.original_price),
        RuleParameter::CurrentPrice => Some(product.current_price),
        RuleParameter::Unknown => None,
    }
}

/// Compares the product attribute named by the condition against its threshold.
///
/// Unknown parameters and operators evaluate to `false`.
pub fn evaluate_condition(condition: &RuleCondition, product: &Product) -> bool {
    let Some(actual) = parameter_value(condition.parameter, product) else {
        return false;
    };
    let expected = condition.value;

    match condition.operator {
        ComparisonOperator::Equal => actual == expected,
        ComparisonOperator::NotEqual => actual != expected,
        ComparisonOperator::GreaterThan => actual > expected,
        ComparisonOperator::GreaterThanOrEqual => actual >= expected,
        ComparisonOperator::LessThan => actual < expected,
        ComparisonOperator::LessThanOrEqual => actual <= expected,
        ComparisonOperator::Unknown => false,
    }
}

/// All conditions must hold. A rule without conditions always matches.
pub fn evaluate_rule(rule: &PricingRule, product: &Product) -> bool {
    rule.conditions.iter().all(|condition| evaluate_condition(condition, product))
}

#[cfg(test)]
mod tests {
    use super::{evaluate_condition, evaluate_rule};
    use crate::domain::{
        product::{Product, ProductAlerts, ProductId},
        rule::{AlertType, ComparisonOperator, PricingRule, RuleCondition, RuleId, RuleParameter},
    };

    fn product() -> Product {
        Product {
            id: ProductId("item-1".to_string()),
            name: "Strawberries".to_string(),
            store: "Downtown".to_string(),
            category: "Produce".to_string(),
            stock: 10,
            days_to_expiry: 1.0,
            original_price: 20.0,
            current_price: 20.0,
            discount: 0.0,
            sales_velocity: 3.0,
            alerts: ProductAlerts::default(),
            matched_rules: Vec::new(),
        }
    }

    fn rule(conditions: Vec<RuleCondition>) -> PricingRule {
        PricingRule {
            id: RuleId("rule-t".to_string()),
            name: "Test".to_string(),
            conditions,
            discount: 10.0,
            priority: 1,
            is_active: true,
            alert_type: AlertType::Other,
            alert_threshold: 0.0,
        }
    }

    #[test]
    fn each_operator_compares_against_the_named_field() {
        let product = product();
        let cases = [
            (RuleParameter::Stock, ComparisonOperator::Equal, 10.0, true),
            (RuleParameter::Stock, ComparisonOperator::NotEqual, 10.0, false),
            (RuleParameter::SalesVelocity, ComparisonOperator::GreaterThan, 3.0, false),
            (RuleParameter::SalesVelocity, ComparisonOperator::GreaterThanOrEqual, 3.0, true),
            (RuleParameter::OriginalPrice, ComparisonOperator::LessThan, 25.0, true),
            (RuleParameter::DaysToExpiry, ComparisonOperator::LessThanOrEqual, 1.0, true),
            (RuleParameter::CurrentPrice, ComparisonOperator::GreaterThan, 19.5, true),
        ];

        for (parameter, operator, value, expected) in cases {
            let condition = RuleCondition::new(parameter, operator, value);
            assert_eq!(
                evaluate_condition(&condition, &product),
                expected,
                "{} should be {expected}",
                condition.describe()
            );
        }
    }

    #[test]
    fn unknown_operator_or_parameter_is_false_not_an_error() {
        let product = product();

        let bad_operator =
            RuleCondition::new(RuleParameter::Stock, ComparisonOperator::Unknown, 10.0);
        let bad_parameter =
            RuleCondition::new(RuleParameter::Unknown, ComparisonOperator::NotEqual, 10.0);

        assert!(!evaluate_condition(&bad_operator, &product));
        assert!(!evaluate_condition(&bad_parameter, &product));
    }

    #[test]
    fn empty_condition_list_always_matches() {
        let mut product = product();
        assert!(evaluate_rule(&rule(Vec::new()), &product));

        product.stock = 0;
        product.days_to_expiry = 400.0;
        assert!(evaluate_rule(&rule(Vec::new()), &product));
    }

    #[test]
    fn conditions_are_combined_with_and() {
        let product = product();
        let both = rule(vec![
            RuleCondition::new(RuleParameter::DaysToExpiry, ComparisonOperator::LessThanOrEqual, 1.0),
            RuleCondition::new(RuleParameter::Stock, ComparisonOperator::GreaterThan, 5.0),
        ]);
        let one_fails = rule(vec![
            RuleCondition::new(RuleParameter::DaysToExpiry, ComparisonOperator::LessThanOrEqual, 1.0),
            RuleCondition::new(RuleParameter::Stock, ComparisonOperator::GreaterThan, 150.0),
        ]);

        assert!(evaluate_rule(&both, &product));
        assert!(!evaluate_rule(&one_fails, &product));
    }

    #[test]
    fn nan_attributes_only_satisfy_not_equal() {
        let mut product = product();
        product.sales_velocity = f64::NAN;

        let lt = RuleCondition::new(RuleParameter::SalesVelocity, ComparisonOperator::LessThan, 5.0);
        let ne = RuleCondition::new(RuleParameter::SalesVelocity, ComparisonOperator::NotEqual, 5.0);

        assert!(!evaluate_condition(&lt, &product));
        assert!(evaluate_condition(&ne, &product));
    }
}
