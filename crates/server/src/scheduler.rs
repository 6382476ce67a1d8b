use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use freshprice_core::errors::ApplicationError;
use freshprice_core::inventory::RefreshOutcome;
use freshprice_db::ProductSnapshotRepository;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::bootstrap::SharedDashboard;

/// Runs one pricing pass under the dashboard lock, then hands the priced
/// products to the snapshot store in a detached task.
///
/// The returned handle belongs to that write. Dropping it does not cancel it,
/// and its failure never touches the in-memory dashboard.
pub async fn run_pass(
    dashboard: &SharedDashboard,
    snapshots: &Arc<dyn ProductSnapshotRepository>,
) -> (RefreshOutcome, Option<JoinHandle<()>>) {
    let now = Utc::now();
    let (outcome, products) = {
        let mut dashboard = dashboard.lock().await;
        let outcome = dashboard.refresh(now);
        let products = match outcome {
            RefreshOutcome::Skipped => None,
            RefreshOutcome::Repriced { .. } => Some(dashboard.products().to_vec()),
        };
        (outcome, products)
    };

    let Some(products) = products else {
        return (outcome, None);
    };

    let snapshots = Arc::clone(snapshots);
    let persist = tokio::spawn(async move {
        if let Err(error) = snapshots.upsert_all(&products, now).await {
            let failure = ApplicationError::from(error).into_interface("scheduler");
            warn!(
                event_name = "system.scheduler.persist_failed",
                correlation_id = %failure.correlation_id,
                failure_kind = ?failure.kind,
                product_count = products.len(),
                error = %failure.detail,
                "product snapshot write failed; in-memory prices are unaffected"
            );
        }
    });

    (outcome, Some(persist))
}

/// Reprices every `interval` until the task is aborted. Ticks that fall
/// behind are skipped rather than replayed.
pub fn spawn(
    dashboard: SharedDashboard,
    snapshots: Arc<dyn ProductSnapshotRepository>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let (outcome, _persist) = run_pass(&dashboard, &snapshots).await;
            debug!(
                event_name = "system.scheduler.tick",
                correlation_id = "scheduler",
                outcome = ?outcome,
                "scheduled pricing pass finished"
            );
        }
    })
}
