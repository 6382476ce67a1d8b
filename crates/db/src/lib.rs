pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect_with_config, connect_with_settings, ping, DbPool};
pub use repositories::{
    load_or_seed_rules, InMemoryProductSnapshotRepository, InMemoryRuleRepository, InMemorySaleRepository,
    ProductSnapshotRepository, RepositoryError, RuleRepository, SaleRepository,
    SqlProductSnapshotRepository, SqlRuleRepository, SqlSaleRepository,
};
