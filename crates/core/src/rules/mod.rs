pub mod store;

pub use store::{default_rules, RuleStore};
