pub mod engine;
pub mod evaluator;

pub use engine::{
    apply_pricing_rules, apply_pricing_rules_to_all, DeterministicPricingEngine, PricingEngine,
};
pub use evaluator::{evaluate_condition, evaluate_rule};
