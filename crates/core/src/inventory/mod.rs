pub mod dashboard;

pub use dashboard::{DashboardSettings, InventoryDashboard, RefreshOutcome};
