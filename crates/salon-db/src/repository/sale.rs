//! # Sale Repository
//!
//! Stock-out ledger for client sales (`sales_history`).
//!
//! ## Snapshot Columns
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  current_stock    balance right after the sale                          │
//! │  remaining_stock  same value; both columns are read by older reports    │
//! │                                                                         │
//! │  Both are derived. The Stock Replayer rewrites them on every pass.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use salon_core::SaleRecord;

const SALE_COLUMNS: &str =
    "sale_id, product_name, quantity, date, created_at, current_stock, remaining_stock, order_ref";

/// Repository for sales ledger operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// All sales of one product, by exact name.
    pub async fn list_for_product(&self, product_name: &str) -> DbResult<Vec<SaleRecord>> {
        let rows = sqlx::query_as::<_, SaleRecord>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales_history
             WHERE product_name = ?1
             ORDER BY date, created_at, sale_id"
        ))
        .bind(product_name)
        .fetch_all(&self.pool)
        .await?;

        debug!(product = %product_name, count = rows.len(), "Loaded sales");
        Ok(rows)
    }

    /// Sales rows produced by one POS order.
    pub async fn list_for_order(&self, order_ref: &str) -> DbResult<Vec<SaleRecord>> {
        let rows = sqlx::query_as::<_, SaleRecord>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales_history WHERE order_ref = ?1 ORDER BY sale_id"
        ))
        .bind(order_ref)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, sale_id: &str) -> DbResult<Option<SaleRecord>> {
        let row = sqlx::query_as::<_, SaleRecord>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales_history WHERE sale_id = ?1"
        ))
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Records a walk-in sale not tied to an order.
    pub async fn insert(
        &self,
        product_name: &str,
        quantity: i64,
        date: DateTime<Utc>,
    ) -> DbResult<SaleRecord> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_with(&mut conn, product_name, quantity, date, None).await
    }

    /// Reads up to `limit` rows; returns how many came back.
    pub async fn sample(&self, limit: i64) -> DbResult<usize> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT sale_id FROM sales_history LIMIT ?1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.len())
    }

    // =========================================================================
    // Transactional writes
    // =========================================================================

    /// Inserts a sale row on the given connection.
    pub async fn insert_with(
        conn: &mut SqliteConnection,
        product_name: &str,
        quantity: i64,
        date: DateTime<Utc>,
        order_ref: Option<&str>,
    ) -> DbResult<SaleRecord> {
        let record = SaleRecord {
            sale_id: Uuid::new_v4().to_string(),
            product_name: product_name.to_string(),
            quantity,
            date,
            created_at: Utc::now(),
            current_stock: None,
            remaining_stock: None,
            order_ref: order_ref.map(str::to_string),
        };

        sqlx::query(
            r#"
            INSERT INTO sales_history
                (sale_id, product_name, quantity, date, created_at, order_ref)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.sale_id)
        .bind(&record.product_name)
        .bind(record.quantity)
        .bind(record.date)
        .bind(record.created_at)
        .bind(&record.order_ref)
        .execute(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Writes the post-sale balance into both snapshot columns.
    pub async fn set_stock_after(
        conn: &mut SqliteConnection,
        sale_id: &str,
        stock_after: i64,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE sales_history SET current_stock = ?1, remaining_stock = ?1 WHERE sale_id = ?2",
        )
        .bind(stock_after)
        .bind(sale_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes one sale row.
    pub async fn delete(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sales_history WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Deletes every sale row an order produced.
    pub async fn delete_for_order(conn: &mut SqliteConnection, order_ref: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sales_history WHERE order_ref = ?1")
            .bind(order_ref)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
