use std::path::{Path, PathBuf};

use chrono::Utc;
use freshprice_core::catalog::VariationModel;
use freshprice_core::domain::dataset::DatasetRecord;
use freshprice_core::domain::rule::{PricingRule, RuleId};
use freshprice_core::errors::ApplicationError;
use freshprice_core::inventory::{DashboardSettings, InventoryDashboard};
use freshprice_core::pricing::DeterministicPricingEngine;
use freshprice_db::load_or_seed_rules;
use serde::Serialize;

use crate::commands::inputs::{describe, read_dataset, read_rule, read_rules};
use crate::commands::storage::{load_config, runtime, Failure, Storage};
use crate::commands::CommandResult;

/// One edit to the stored rule set. Indexes are zero-based positions in
/// priority order.
#[derive(Debug, Clone)]
pub enum RuleEdit {
    Add(PathBuf),
    Update(PathBuf),
    Enable(RuleId),
    Disable(RuleId),
    Delete(RuleId),
    MoveUp(usize),
    MoveDown(usize),
    Import(PathBuf),
}

impl RuleEdit {
    fn action(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Update(_) => "update",
            Self::Enable(_) => "enable",
            Self::Disable(_) => "disable",
            Self::Delete(_) => "delete",
            Self::MoveUp(_) => "move_up",
            Self::MoveDown(_) => "move_down",
            Self::Import(_) => "import",
        }
    }
}

/// A [`RuleEdit`] with its file inputs already read.
enum Change {
    Add(PricingRule),
    Update(PricingRule),
    SetActive(RuleId, bool),
    Delete(RuleId),
    MoveUp(usize),
    MoveDown(usize),
    Replace(Vec<PricingRule>),
}

#[derive(Debug, Serialize)]
struct RuleEditReport {
    command: &'static str,
    status: &'static str,
    action: &'static str,
    changed: bool,
    persisted: bool,
    active_count: usize,
    rules: Vec<PricingRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pricing: Option<PricingEffect>,
}

/// How the edited rule set prices the `--dataset`, when one is given.
#[derive(Debug, Serialize)]
struct PricingEffect {
    product_count: usize,
    alert_count: usize,
}

/// Applies `edit` to the stored rules (seeding the built-in set on first use)
/// and saves the result. A no-op move is reported and not saved.
pub fn run(edit: &RuleEdit, dataset_path: Option<&Path>, dry_run: bool) -> CommandResult {
    let records = match dataset_path.map(read_dataset).transpose() {
        Ok(records) => records,
        Err(error) => return CommandResult::failure("rule", "invalid_dataset", describe(&error), 2),
    };
    let change = match read_change(edit) {
        Ok(change) => change,
        Err(error) => return CommandResult::failure("rule", "invalid_rules", describe(&error), 2),
    };

    match apply(edit.action(), change, records, dry_run) {
        Ok(report) => CommandResult::report("rule", &report),
        Err(failure) => failure.into_result("rule"),
    }
}

fn read_change(edit: &RuleEdit) -> anyhow::Result<Change> {
    Ok(match edit {
        RuleEdit::Add(path) => Change::Add(read_rule(path)?),
        RuleEdit::Update(path) => Change::Update(read_rule(path)?),
        RuleEdit::Enable(id) => Change::SetActive(id.clone(), true),
        RuleEdit::Disable(id) => Change::SetActive(id.clone(), false),
        RuleEdit::Delete(id) => Change::Delete(id.clone()),
        RuleEdit::MoveUp(index) => Change::MoveUp(*index),
        RuleEdit::MoveDown(index) => Change::MoveDown(*index),
        RuleEdit::Import(path) => Change::Replace(read_rules(Some(path.as_path()))?.snapshot()),
    })
}

fn apply(
    action: &'static str,
    change: Change,
    records: Option<Vec<DatasetRecord>>,
    dry_run: bool,
) -> Result<RuleEditReport, Failure> {
    let config = if dry_run { None } else { Some(load_config()?) };

    runtime()?.block_on(async {
        let storage = Storage::open_or_in_memory(config.as_ref()).await?;
        let outcome = edit_and_save(&storage, action, change, records).await;
        storage.close().await;
        outcome
    })
}

async fn edit_and_save(
    storage: &Storage,
    action: &'static str,
    change: Change,
    records: Option<Vec<DatasetRecord>>,
) -> Result<RuleEditReport, Failure> {
    let rules = load_or_seed_rules(&*storage.rules).await.map_err(ApplicationError::from)?;
    let settings = DashboardSettings { variation: VariationModel::None, ..DashboardSettings::default() };
    let mut dashboard = InventoryDashboard::new(DeterministicPricingEngine, rules, settings);
    let now = Utc::now();
    let has_dataset = records.is_some();
    if let Some(records) = records {
        dashboard.load_dataset(records, now);
    }

    let changed = match change {
        Change::Add(rule) => dashboard.add_rule(rule, now).map(|_| true),
        Change::Update(rule) => dashboard.update_rule(rule, now).map(|()| true),
        Change::SetActive(id, is_active) => {
            dashboard.set_rule_active(&id, is_active, now).map(|()| true)
        }
        Change::Delete(id) => dashboard.delete_rule(&id, now).map(|()| true),
        Change::MoveUp(index) => Ok(dashboard.move_rule_up(index, now)),
        Change::MoveDown(index) => Ok(dashboard.move_rule_down(index, now)),
        Change::Replace(rules) => dashboard.replace_rules(rules, now).map(|()| true),
    }
    .map_err(ApplicationError::from)?;

    if changed {
        storage.rules.replace_all(dashboard.rules()).await.map_err(ApplicationError::from)?;
    }

    let pricing = has_dataset.then(|| PricingEffect {
        product_count: dashboard.products().len(),
        alert_count: dashboard.products().iter().filter(|product| product.alerts.any()).count(),
    });

    Ok(RuleEditReport {
        command: "rule",
        status: "ok",
        action,
        changed,
        persisted: changed && storage.is_persistent(),
        active_count: dashboard.rules().iter().filter(|rule| rule.is_active).count(),
        rules: dashboard.rules().to_vec(),
        pricing,
    })
}
