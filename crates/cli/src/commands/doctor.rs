use freshprice_core::config::{AppConfig, LoadOptions};
use freshprice_db::{connect_with_config, ping};
use serde::Serialize;

use crate::commands::inputs::{describe, read_dataset};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn new(name: &'static str, status: CheckStatus, details: impl Into<String>) -> Self {
        Self { name, status, details: details.into() }
    }

    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Pass, details)
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Fail, details)
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self::new(name, CheckStatus::Skipped, reason)
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let checks = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => vec![
            DoctorCheck::pass("config_validation", "configuration loaded and validated"),
            check_database_connectivity(&config),
            check_dataset(&config),
        ],
        Err(error) => {
            let reason = "skipped because configuration did not load";
            vec![
                DoctorCheck::fail("config_validation", error.to_string()),
                DoctorCheck::skipped("database_connectivity", reason),
                DoctorCheck::skipped("dataset_readiness", reason),
            ]
        }
    };

    // Skipped checks do not fail the report on their own.
    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let (overall_status, summary) = if any_failed {
        (CheckStatus::Fail, "doctor: one or more readiness checks failed")
    } else {
        (CheckStatus::Pass, "doctor: all readiness checks passed")
    };

    DoctorReport { overall_status, summary: summary.to_string(), checks }
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck::fail(
                "database_connectivity",
                format!("failed to initialize async runtime: {error}"),
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;
        let answered = ping(&pool).await.map_err(|error| format!("database did not answer: {error}"));
        pool.close().await;
        answered
    });

    match result {
        Ok(()) => DoctorCheck::pass(
            "database_connectivity",
            format!("connected using `{}`", config.database.url),
        ),
        Err(error) => DoctorCheck::fail("database_connectivity", error),
    }
}

fn check_dataset(config: &AppConfig) -> DoctorCheck {
    let Some(path) = config.pricing.dataset_path.as_deref() else {
        return DoctorCheck::skipped(
            "dataset_readiness",
            "pricing.dataset_path is unset; the server starts with an empty dataset",
        );
    };

    match read_dataset(path) {
        Ok(records) => DoctorCheck::pass(
            "dataset_readiness",
            format!("{} record(s) in `{}`", records.len(), path.display()),
        ),
        Err(error) => DoctorCheck::fail("dataset_readiness", describe(&error)),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
