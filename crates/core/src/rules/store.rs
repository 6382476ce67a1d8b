use std::collections::HashSet;

use tracing::info;

use crate::domain::rule::{
    AlertType, ComparisonOperator, PricingRule, RuleCondition, RuleId, RuleParameter,
};
use crate::errors::DomainError;

/// Ordered, user-editable rule list.
///
/// Position and priority always agree: priorities are a dense `1..=len`
/// sequence after every structural change.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleStore {
    rules: Vec<PricingRule>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from persisted or imported rules, ordering them by their
    /// existing priority before renumbering. Blank ids are generated; a
    /// repeated id rejects the whole set.
    pub fn from_rules(mut rules: Vec<PricingRule>) -> Result<Self, DomainError> {
        let mut seen = HashSet::with_capacity(rules.len());
        for rule in &mut rules {
            if rule.id.0.trim().is_empty() {
                rule.id = RuleId::generate();
            }
            if !seen.insert(rule.id.clone()) {
                return Err(DomainError::DuplicateRule(rule.id.clone()));
            }
        }

        rules.sort_by_key(|rule| rule.priority);
        let mut store = Self { rules };
        store.renumber();
        Ok(store)
    }

    pub fn with_default_rules() -> Self {
        Self { rules: default_rules() }
    }

    pub fn rules(&self) -> &[PricingRule] {
        &self.rules
    }

    pub fn snapshot(&self) -> Vec<PricingRule> {
        self.rules.clone()
    }

    pub fn get(&self, id: &RuleId) -> Option<&PricingRule> {
        self.rules.iter().find(|rule| &rule.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.rules.iter().filter(|rule| rule.is_active).count()
    }

    /// Appends a rule at the lowest priority. A blank id is replaced with a
    /// generated one.
    pub fn add(&mut self, mut rule: PricingRule) -> Result<RuleId, DomainError> {
        if rule.id.0.trim().is_empty() {
            rule.id = RuleId::generate();
        }
        if self.get(&rule.id).is_some() {
            return Err(DomainError::DuplicateRule(rule.id));
        }

        rule.priority = next_priority(self.rules.len());
        let id = rule.id.clone();
        info!(
            event_name = "rules.store.added",
            rule_id = %id,
            priority = rule.priority,
            "pricing rule added"
        );
        self.rules.push(rule);
        Ok(id)
    }

    /// Replaces the rule with the same id. Its position and priority are kept.
    pub fn update(&mut self, rule: PricingRule) -> Result<(), DomainError> {
        let index = self.position(&rule.id)?;
        let priority = self.rules[index].priority;
        self.rules[index] = PricingRule { priority, ..rule };
        info!(
            event_name = "rules.store.updated",
            rule_id = %self.rules[index].id,
            "pricing rule updated"
        );
        Ok(())
    }

    pub fn set_active(&mut self, id: &RuleId, is_active: bool) -> Result<(), DomainError> {
        let index = self.position(id)?;
        self.rules[index].is_active = is_active;
        Ok(())
    }

    pub fn delete(&mut self, id: &RuleId) -> Result<PricingRule, DomainError> {
        let index = self.position(id)?;
        let removed = self.rules.remove(index);
        self.renumber();
        info!(
            event_name = "rules.store.deleted",
            rule_id = %removed.id,
            remaining = self.rules.len(),
            "pricing rule deleted"
        );
        Ok(removed)
    }

    /// Swaps the rule at `index` with the one above it. No-op for the first
    /// rule or an out-of-range index.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.rules.len() {
            return false;
        }
        self.rules.swap(index, index - 1);
        self.renumber();
        true
    }

    /// Swaps the rule at `index` with the one below it. No-op for the last
    /// rule or an out-of-range index.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index >= self.rules.len().saturating_sub(1) {
            return false;
        }
        self.rules.swap(index, index + 1);
        self.renumber();
        true
    }

    fn position(&self, id: &RuleId) -> Result<usize, DomainError> {
        self.rules
            .iter()
            .position(|rule| &rule.id == id)
            .ok_or_else(|| DomainError::RuleNotFound(id.clone()))
    }

    fn renumber(&mut self) {
        for (index, rule) in self.rules.iter_mut().enumerate() {
            rule.priority = next_priority(index);
        }
    }
}

fn next_priority(len: usize) -> u32 {
    u32::try_from(len).map(|len| len.saturating_add(1)).unwrap_or(u32::MAX)
}

fn single_condition_rule(
    id: &str,
    name: &str,
    condition: RuleCondition,
    discount: f64,
    alert_type: AlertType,
) -> PricingRule {
    PricingRule {
        id: RuleId(id.to_string()),
        name: name.to_string(),
        alert_threshold: condition.value,
        conditions: vec![condition],
        discount,
        priority: 0,
        is_active: true,
        alert_type,
    }
}

/// The rule set a fresh dashboard starts with.
pub fn default_rules() -> Vec<PricingRule> {
    let rules = vec![
        single_condition_rule(
            "rule-1",
            "Critical Expiry",
            RuleCondition::new(RuleParameter::DaysToExpiry, ComparisonOperator::LessThanOrEqual, 1.0),
            50.0,
            AlertType::Expiry,
        ),
        single_condition_rule(
            "rule-2",
            "Near Expiry",
            RuleCondition::new(RuleParameter::DaysToExpiry, ComparisonOperator::LessThanOrEqual, 3.0),
            25.0,
            AlertType::Expiry,
        ),
        single_condition_rule(
            "rule-3",
            "High Stock",
            RuleCondition::new(RuleParameter::Stock, ComparisonOperator::GreaterThan, 150.0),
            15.0,
            AlertType::Stock,
        ),
        single_condition_rule(
            "rule-4",
            "Low Demand",
            RuleCondition::new(RuleParameter::SalesVelocity, ComparisonOperator::LessThan, 5.0),
            10.0,
            AlertType::SalesVelocity,
        ),
    ];

    rules
        .into_iter()
        .enumerate()
        .map(|(index, rule)| PricingRule { priority: next_priority(index), ..rule })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{default_rules, RuleStore};
    use crate::domain::rule::{AlertType, PricingRule, RuleId};
    use crate::errors::DomainError;

    fn rule(id: &str) -> PricingRule {
        PricingRule {
            id: RuleId(id.to_string()),
            name: id.to_uppercase(),
            conditions: Vec::new(),
            discount: 5.0,
            priority: 99,
            is_active: true,
            alert_type: AlertType::Other,
            alert_threshold: 0.0,
        }
    }

    fn ids(store: &RuleStore) -> Vec<&str> {
        store.rules().iter().map(|rule| rule.id.0.as_str()).collect()
    }

    fn priorities(store: &RuleStore) -> Vec<u32> {
        store.rules().iter().map(|rule| rule.priority).collect()
    }

    fn store_abc() -> RuleStore {
        let mut store = RuleStore::new();
        for id in ["a", "b", "c"] {
            store.add(rule(id)).expect("add rule");
        }
        store
    }

    #[test]
    fn add_appends_with_next_priority() {
        let store = store_abc();
        assert_eq!(ids(&store), vec!["a", "b", "c"]);
        assert_eq!(priorities(&store), vec![1, 2, 3]);
    }

    #[test]
    fn add_generates_an_id_for_blank_rules_and_rejects_duplicates() {
        let mut store = store_abc();

        let generated = store.add(rule("  ")).expect("blank id gets generated");
        assert!(generated.0.starts_with("rule-"));
        assert_eq!(store.get(&generated).map(|rule| rule.priority), Some(4));

        let error = store.add(rule("a")).expect_err("duplicate id");
        assert_eq!(error, DomainError::DuplicateRule(RuleId("a".to_string())));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn deleting_the_first_of_three_renumbers_the_rest() {
        let mut store = store_abc();

        let removed = store.delete(&RuleId("a".to_string())).expect("delete");

        assert_eq!(removed.id.0, "a");
        assert_eq!(ids(&store), vec!["b", "c"]);
        assert_eq!(priorities(&store), vec![1, 2]);
    }

    #[test]
    fn delete_unknown_rule_is_an_error() {
        let mut store = store_abc();
        let error = store.delete(&RuleId("zzz".to_string())).expect_err("unknown id");
        assert!(matches!(error, DomainError::RuleNotFound(_)));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn update_replaces_by_id_and_keeps_priority() {
        let mut store = store_abc();
        let mut edited = rule("b");
        edited.discount = 40.0;
        edited.priority = 1;

        store.update(edited).expect("update");

        let b = store.get(&RuleId("b".to_string())).expect("rule b");
        assert_eq!(b.discount, 40.0);
        assert_eq!(b.priority, 2);
        assert_eq!(ids(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn move_up_and_down_swap_neighbours_and_renumber() {
        let mut store = store_abc();

        assert!(store.move_up(2));
        assert_eq!(ids(&store), vec!["a", "c", "b"]);
        assert_eq!(priorities(&store), vec![1, 2, 3]);

        assert!(store.move_down(0));
        assert_eq!(ids(&store), vec!["c", "a", "b"]);
        assert_eq!(priorities(&store), vec![1, 2, 3]);
    }

    #[test]
    fn moves_at_the_boundaries_are_no_ops() {
        let mut store = store_abc();

        assert!(!store.move_up(0));
        assert!(!store.move_down(2));
        assert!(!store.move_down(17));
        assert!(!store.move_up(17));
        assert!(!store.move_down(usize::MAX));
        assert!(!store.move_up(usize::MAX));
        assert_eq!(ids(&store), vec!["a", "b", "c"]);

        let mut empty = RuleStore::new();
        assert!(!empty.move_down(0));
        assert!(!empty.move_up(0));
    }

    #[test]
    fn from_rules_orders_by_existing_priority_then_densifies() {
        let mut low = rule("low");
        low.priority = 10;
        let mut high = rule("high");
        high.priority = 2;
        let mut tie = rule("tie");
        tie.priority = 10;

        let store = RuleStore::from_rules(vec![low, high, tie]).expect("unique ids");

        assert_eq!(ids(&store), vec!["high", "low", "tie"]);
        assert_eq!(priorities(&store), vec![1, 2, 3]);
    }

    #[test]
    fn from_rules_rejects_repeated_ids() {
        let rules: Vec<PricingRule> = serde_json::from_str(
            r#"[
              {"id": "x", "name": "First", "priority": 1, "isActive": true, "discount": 10,
               "alertType": "other", "alertThreshold": 0, "conditions": []},
              {"id": "x", "name": "Second", "priority": 2, "isActive": true, "discount": 20,
               "alertType": "other", "alertThreshold": 0, "conditions": []}
            ]"#,
        )
        .expect("rules json");

        let error = RuleStore::from_rules(rules).expect_err("repeated id");

        assert_eq!(error, DomainError::DuplicateRule(RuleId("x".to_string())));
    }

    #[test]
    fn from_rules_generates_ids_for_blank_rules() {
        let store = RuleStore::from_rules(vec![rule(""), rule(" ")]).expect("blank ids");

        assert_eq!(store.len(), 2);
        assert_ne!(store.rules()[0].id, store.rules()[1].id);
        assert!(store.rules().iter().all(|rule| rule.id.0.starts_with("rule-")));
    }

    #[test]
    fn set_active_toggles_without_reordering() {
        let mut store = store_abc();
        store.set_active(&RuleId("b".to_string()), false).expect("toggle");

        assert_eq!(store.active_count(), 2);
        assert_eq!(ids(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn default_rules_ship_with_dense_priorities() {
        let rules = default_rules();
        let names: Vec<&str> = rules.iter().map(|rule| rule.name.as_str()).collect();

        assert_eq!(names, vec!["Critical Expiry", "Near Expiry", "High Stock", "Low Demand"]);
        assert_eq!(rules.iter().map(|rule| rule.priority).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(RuleStore::with_default_rules().active_count(), 4);
    }
}
