use chrono::Utc;
use sqlx::Row;
use tracing::info;

use freshprice_core::domain::rule::{AlertType, PricingRule, RuleCondition, RuleId};
use freshprice_core::rules::RuleStore;

use super::{RepositoryError, RuleRepository};
use crate::DbPool;

pub struct SqlRuleRepository {
    pool: DbPool,
}

impl SqlRuleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_rule(row: &sqlx::sqlite::SqliteRow) -> Result<PricingRule, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let priority_raw: i64 =
        row.try_get("priority").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let is_active: bool =
        row.try_get("is_active").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let discount: f64 =
        row.try_get("discount").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let alert_type_str: String =
        row.try_get("alert_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let alert_threshold: f64 =
        row.try_get("alert_threshold").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let conditions_json: String =
        row.try_get("conditions_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let priority = u32::try_from(priority_raw).map_err(|_| {
        RepositoryError::Decode(format!("rule `{id}` has out-of-range priority `{priority_raw}`"))
    })?;
    let alert_type: AlertType = alert_type_str.parse().map_err(RepositoryError::Decode)?;
    let conditions: Vec<RuleCondition> = serde_json::from_str(&conditions_json)
        .map_err(|e| RepositoryError::Decode(format!("rule `{id}` conditions: {e}")))?;

    Ok(PricingRule {
        id: RuleId(id),
        name,
        conditions,
        discount,
        priority,
        is_active,
        alert_type,
        alert_threshold,
    })
}

/// Persisted rules when there are any; otherwise the built-in set, which is
/// written back so the next reader sees the same list.
pub async fn load_or_seed_rules(repo: &dyn RuleRepository) -> Result<RuleStore, RepositoryError> {
    let stored = repo.list_ordered().await?;
    if !stored.is_empty() {
        info!(event_name = "db.pricing_rule.loaded", rule_count = stored.len(), "rule set loaded");
        return RuleStore::from_rules(stored)
            .map_err(|error| RepositoryError::Decode(error.to_string()));
    }

    let store = RuleStore::with_default_rules();
    repo.replace_all(store.rules()).await?;
    info!(event_name = "db.pricing_rule.seeded", rule_count = store.len(), "default rule set seeded");
    Ok(store)
}

#[async_trait::async_trait]
impl RuleRepository for SqlRuleRepository {
    async fn list_ordered(&self) -> Result<Vec<PricingRule>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, priority, is_active, discount, alert_type, alert_threshold,
                    conditions_json
             FROM pricing_rule
             ORDER BY priority ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_rule).collect()
    }

    async fn replace_all(&self, rules: &[PricingRule]) -> Result<(), RepositoryError> {
        let updated_at = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM pricing_rule").execute(&mut *tx).await?;

        for rule in rules {
            let conditions_json = serde_json::to_string(&rule.conditions)
                .map_err(|e| RepositoryError::Decode(e.to_string()))?;

            sqlx::query(
                "INSERT INTO pricing_rule (id, name, priority, is_active, discount, alert_type,
                                           alert_threshold, conditions_json, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&rule.id.0)
            .bind(&rule.name)
            .bind(i64::from(rule.priority))
            .bind(rule.is_active)
            .bind(rule.discount)
            .bind(rule.alert_type.as_str())
            .bind(rule.alert_threshold)
            .bind(conditions_json)
            .bind(&updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(event_name = "db.pricing_rule.replaced", rule_count = rules.len(), "rule set saved");
        Ok(())
    }
}
