use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;
use tracing::info;

use freshprice_core::domain::product::ProductId;
use freshprice_core::domain::sale::{Sale, SaleId, SaleLine};

use super::{RepositoryError, SaleRepository};
use crate::DbPool;

pub struct SqlSaleRepository {
    pool: DbPool,
}

impl SqlSaleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_lines(&self, sale_id: &str) -> Result<Vec<SaleLine>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT product_id, product_name, quantity, unit_price, original_price,
                    discount_pct, subtotal
             FROM sale_line
             WHERE sale_id = ?
             ORDER BY line_number ASC",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_line).collect()
    }
}

fn get<'r, T>(row: &'r sqlx::sqlite::SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn decimal(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<Decimal, RepositoryError> {
    let raw: String = get(row, column)?;
    Decimal::from_str(&raw)
        .map_err(|e| RepositoryError::Decode(format!("{column} `{raw}` is not a decimal: {e}")))
}

fn row_to_line(row: &sqlx::sqlite::SqliteRow) -> Result<SaleLine, RepositoryError> {
    let quantity_raw: i64 = get(row, "quantity")?;
    let quantity = u32::try_from(quantity_raw)
        .map_err(|_| RepositoryError::Decode(format!("quantity `{quantity_raw}` is out of range")))?;

    Ok(SaleLine {
        product_id: ProductId(get(row, "product_id")?),
        product_name: get(row, "product_name")?,
        quantity,
        unit_price: decimal(row, "unit_price")?,
        original_price: decimal(row, "original_price")?,
        discount_pct: decimal(row, "discount_pct")?,
        subtotal: decimal(row, "subtotal")?,
    })
}

fn parse_sold_at(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("sold_at `{raw}`: {e}")))
}

#[async_trait::async_trait]
impl SaleRepository for SqlSaleRepository {
    /// Writes the header and lines and takes the sold units off the matching
    /// product snapshots, all in one transaction. Snapshot stock floors at zero.
    async fn record_sale(&self, sale: &Sale) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO sale (id, sold_at, subtotal, tax, total) VALUES (?, ?, ?, ?, ?)")
            .bind(&sale.id.0)
            .bind(sale.sold_at.to_rfc3339())
            .bind(sale.subtotal.to_string())
            .bind(sale.tax.to_string())
            .bind(sale.total.to_string())
            .execute(&mut *tx)
            .await?;

        for (index, line) in sale.lines.iter().enumerate() {
            let line_number = i64::try_from(index + 1)
                .map_err(|_| RepositoryError::Decode("too many sale lines".to_string()))?;

            sqlx::query(
                "INSERT INTO sale_line (sale_id, line_number, product_id, product_name, quantity,
                                        unit_price, original_price, discount_pct, subtotal)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&sale.id.0)
            .bind(line_number)
            .bind(&line.product_id.0)
            .bind(&line.product_name)
            .bind(i64::from(line.quantity))
            .bind(line.unit_price.to_string())
            .bind(line.original_price.to_string())
            .bind(line.discount_pct.to_string())
            .bind(line.subtotal.to_string())
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE product_snapshot SET stock = MAX(stock - ?, 0) WHERE id = ?")
                .bind(i64::from(line.quantity))
                .bind(&line.product_id.0)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!(
            event_name = "db.sale.recorded",
            sale_id = %sale.id.0,
            line_count = sale.lines.len(),
            total = %sale.total,
            "sale persisted"
        );
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Sale>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, sold_at, subtotal, tax, total
             FROM sale
             ORDER BY sold_at DESC, rowid DESC
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = get(row, "id")?;
            let sold_at: String = get(row, "sold_at")?;
            let lines = self.load_lines(&id).await?;
            sales.push(Sale {
                id: SaleId(id),
                sold_at: parse_sold_at(&sold_at)?,
                lines,
                subtotal: decimal(row, "subtotal")?,
                tax: decimal(row, "tax")?,
                total: decimal(row, "total")?,
            });
        }
        Ok(sales)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use freshprice_core::domain::product::{Product, ProductAlerts, ProductId};
    use freshprice_core::domain::sale::{Sale, SaleId, SaleLine};

    use super::SqlSaleRepository;
    use crate::repositories::{
        ProductSnapshotRepository, SaleRepository, SqlProductSnapshotRepository,
    };
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn line(product_id: &str, quantity: u32, unit_cents: i64) -> SaleLine {
        SaleLine {
            product_id: ProductId(product_id.to_string()),
            product_name: product_id.to_uppercase(),
            quantity,
            unit_price: Decimal::new(unit_cents, 2),
            original_price: Decimal::new(unit_cents * 2, 2),
            discount_pct: Decimal::new(5000, 2),
            subtotal: Decimal::new(unit_cents * i64::from(quantity), 2),
        }
    }

    fn sale(id: &str, minutes: i64, lines: Vec<SaleLine>) -> Sale {
        let subtotal: Decimal = lines.iter().map(|line| line.subtotal).sum();
        let tax = (subtotal * Decimal::new(8, 2)).round_dp(2);
        Sale {
            id: SaleId(id.to_string()),
            sold_at: Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).single().expect("valid time")
                + Duration::minutes(minutes),
            lines,
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }

    fn snapshot(id: &str, stock: u32) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: id.to_string(),
            store: "Harbor".to_string(),
            category: "Bakery".to_string(),
            stock,
            days_to_expiry: 2.0,
            original_price: 5.0,
            current_price: 2.5,
            discount: 50.0,
            sales_velocity: 6.0,
            alerts: ProductAlerts::default(),
            matched_rules: Vec::new(),
        }
    }

    #[tokio::test]
    async fn recorded_sales_list_newest_first_with_lines() {
        let repo = SqlSaleRepository::new(setup().await);
        let first = sale("sale-a", 0, vec![line("bread", 2, 250)]);
        let second = sale("sale-b", 5, vec![line("bagel", 1, 125), line("bread", 3, 250)]);

        repo.record_sale(&first).await.expect("first sale");
        repo.record_sale(&second).await.expect("second sale");

        let recent = repo.list_recent(10).await.expect("list");
        assert_eq!(recent, vec![second.clone(), first]);

        let limited = repo.list_recent(1).await.expect("limited list");
        assert_eq!(limited, vec![second]);
    }

    #[tokio::test]
    async fn recording_a_sale_decrements_snapshot_stock() {
        let pool = setup().await;
        let snapshots = SqlProductSnapshotRepository::new(pool.clone());
        snapshots
            .upsert_all(&[snapshot("bread", 5), snapshot("bagel", 1)], Utc::now())
            .await
            .expect("snapshots");

        let repo = SqlSaleRepository::new(pool);
        repo.record_sale(&sale("sale-a", 0, vec![line("bread", 2, 250), line("bagel", 4, 125)]))
            .await
            .expect("sale");

        let stock: Vec<(String, u32)> = snapshots
            .list_by_expiry()
            .await
            .expect("list")
            .into_iter()
            .map(|product| (product.id.0, product.stock))
            .collect();
        assert_eq!(stock, vec![("bagel".to_string(), 0), ("bread".to_string(), 3)]);
    }

    #[tokio::test]
    async fn duplicate_sale_id_rolls_back_the_whole_sale() {
        let pool = setup().await;
        let snapshots = SqlProductSnapshotRepository::new(pool.clone());
        snapshots.upsert_all(&[snapshot("bread", 5)], Utc::now()).await.expect("snapshot");

        let repo = SqlSaleRepository::new(pool);
        repo.record_sale(&sale("sale-a", 0, vec![line("bread", 1, 250)])).await.expect("sale");
        repo.record_sale(&sale("sale-a", 1, vec![line("bread", 3, 250)]))
            .await
            .expect_err("duplicate id");

        let listed = snapshots.list_by_expiry().await.expect("list");
        assert_eq!(listed[0].stock, 4);
        assert_eq!(repo.list_recent(10).await.expect("list").len(), 1);
    }
}
