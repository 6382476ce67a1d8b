use std::path::Path;

use freshprice_core::domain::rule::PricingRule;
use serde::Serialize;

use crate::commands::inputs::{describe, read_rules};
use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct RulesReport<'a> {
    command: &'static str,
    status: &'static str,
    active_count: usize,
    rules: &'a [PricingRule],
    conditions: Vec<Vec<String>>,
}

pub fn run(rules_path: Option<&Path>) -> CommandResult {
    let store = match read_rules(rules_path) {
        Ok(store) => store,
        Err(error) => return CommandResult::failure("rules", "invalid_rules", describe(&error), 2),
    };

    let conditions = store
        .rules()
        .iter()
        .map(|rule| rule.conditions.iter().map(|condition| condition.describe()).collect())
        .collect();

    CommandResult::report(
        "rules",
        &RulesReport {
            command: "rules",
            status: "ok",
            active_count: store.active_count(),
            rules: store.rules(),
            conditions,
        },
    )
}
