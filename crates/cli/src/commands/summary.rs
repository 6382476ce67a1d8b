use std::path::Path;

use freshprice_core::catalog::summarize;
use freshprice_core::domain::dataset::DatasetSummary;
use serde::Serialize;

use crate::commands::inputs::{describe, read_dataset};
use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct SummaryReport {
    command: &'static str,
    status: &'static str,
    summary: Option<DatasetSummary>,
}

pub fn run(dataset_path: &Path) -> CommandResult {
    match read_dataset(dataset_path) {
        Ok(records) => CommandResult::report(
            "summary",
            &SummaryReport { command: "summary", status: "ok", summary: summarize(&records) },
        ),
        Err(error) => CommandResult::failure("summary", "invalid_dataset", describe(&error), 2),
    }
}
