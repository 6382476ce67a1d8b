use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::debug;

use freshprice_core::domain::product::{Product, ProductAlerts, ProductId};
use freshprice_core::domain::rule::RuleId;

use super::{ProductSnapshotRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProductSnapshotRepository {
    pool: DbPool,
}

impl SqlProductSnapshotRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_err(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let stock_raw: i64 = row.try_get("stock").map_err(decode_err)?;
    let stock = u32::try_from(stock_raw)
        .map_err(|_| RepositoryError::Decode(format!("stock `{stock_raw}` is out of range")))?;

    let alerts_json: String = row.try_get("alerts_json").map_err(decode_err)?;
    let alerts: ProductAlerts = serde_json::from_str(&alerts_json).map_err(decode_err)?;
    let matched_json: String = row.try_get("matched_rules_json").map_err(decode_err)?;
    let matched_rules: Vec<RuleId> = serde_json::from_str(&matched_json).map_err(decode_err)?;

    Ok(Product {
        id: ProductId(row.try_get("id").map_err(decode_err)?),
        name: row.try_get("name").map_err(decode_err)?,
        store: row.try_get("store").map_err(decode_err)?,
        category: row.try_get("category").map_err(decode_err)?,
        stock,
        days_to_expiry: row.try_get("days_to_expiry").map_err(decode_err)?,
        original_price: row.try_get("original_price").map_err(decode_err)?,
        current_price: row.try_get("current_price").map_err(decode_err)?,
        discount: row.try_get("discount").map_err(decode_err)?,
        sales_velocity: row.try_get("sales_velocity").map_err(decode_err)?,
        alerts,
        matched_rules,
    })
}

#[async_trait::async_trait]
impl ProductSnapshotRepository for SqlProductSnapshotRepository {
    async fn upsert_all(
        &self,
        products: &[Product],
        priced_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        let priced_at = priced_at.to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for product in products {
            let alerts_json = serde_json::to_string(&product.alerts).map_err(decode_err)?;
            let matched_json = serde_json::to_string(&product.matched_rules).map_err(decode_err)?;

            sqlx::query(
                "INSERT INTO product_snapshot (id, name, store, category, stock, days_to_expiry,
                                               original_price, current_price, discount,
                                               sales_velocity, alerts_json, matched_rules_json,
                                               priced_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     store = excluded.store,
                     category = excluded.category,
                     stock = excluded.stock,
                     days_to_expiry = excluded.days_to_expiry,
                     original_price = excluded.original_price,
                     current_price = excluded.current_price,
                     discount = excluded.discount,
                     sales_velocity = excluded.sales_velocity,
                     alerts_json = excluded.alerts_json,
                     matched_rules_json = excluded.matched_rules_json,
                     priced_at = excluded.priced_at",
            )
            .bind(&product.id.0)
            .bind(&product.name)
            .bind(&product.store)
            .bind(&product.category)
            .bind(i64::from(product.stock))
            .bind(product.days_to_expiry)
            .bind(product.original_price)
            .bind(product.current_price)
            .bind(product.discount)
            .bind(product.sales_velocity)
            .bind(alerts_json)
            .bind(matched_json)
            .bind(&priced_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(
            event_name = "db.product_snapshot.upserted",
            product_count = products.len(),
            "product snapshots written"
        );
        Ok(products.len())
    }

    async fn list_by_expiry(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, store, category, stock, days_to_expiry, original_price,
                    current_price, discount, sales_velocity, alerts_json, matched_rules_json
             FROM product_snapshot
             ORDER BY days_to_expiry ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }
}
