use freshprice_core::domain::sale::Sale;
use freshprice_core::errors::ApplicationError;
use serde::Serialize;

use crate::commands::storage::{load_config, runtime, Failure, Storage};
use crate::commands::CommandResult;

pub const DEFAULT_LIMIT: u32 = 20;

#[derive(Debug, Serialize)]
struct SalesReport {
    command: &'static str,
    status: &'static str,
    sale_count: usize,
    sales: Vec<Sale>,
}

/// Lists the most recent recorded sales, newest first.
pub fn run(limit: u32) -> CommandResult {
    match list(limit) {
        Ok(sales) => CommandResult::report(
            "sales",
            &SalesReport { command: "sales", status: "ok", sale_count: sales.len(), sales },
        ),
        Err(failure) => failure.into_result("sales"),
    }
}

fn list(limit: u32) -> Result<Vec<Sale>, Failure> {
    let config = load_config()?;

    runtime()?.block_on(async {
        let storage = Storage::open(&config).await?;
        let sales = storage.sales.list_recent(limit).await.map_err(ApplicationError::from);
        storage.close().await;
        Ok::<_, Failure>(sales?)
    })
}
