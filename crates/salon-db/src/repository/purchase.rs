//! # Purchase Repository
//!
//! Stock-in ledger (`purchase_history_with_stock`).

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use salon_core::PurchaseRecord;

/// Repository for purchase ledger operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// All purchases of one product, by exact name.
    pub async fn list_for_product(&self, product_name: &str) -> DbResult<Vec<PurchaseRecord>> {
        let rows = sqlx::query_as::<_, PurchaseRecord>(
            r#"
            SELECT purchase_id, product_name, purchase_qty, date, created_at, stock_after_purchase
            FROM purchase_history_with_stock
            WHERE product_name = ?1
            ORDER BY date, created_at, purchase_id
            "#,
        )
        .bind(product_name)
        .fetch_all(&self.pool)
        .await?;

        debug!(product = %product_name, count = rows.len(), "Loaded purchases");
        Ok(rows)
    }

    /// Gets a purchase by ID.
    pub async fn get_by_id(&self, purchase_id: &str) -> DbResult<Option<PurchaseRecord>> {
        let row = sqlx::query_as::<_, PurchaseRecord>(
            r#"
            SELECT purchase_id, product_name, purchase_qty, date, created_at, stock_after_purchase
            FROM purchase_history_with_stock
            WHERE purchase_id = ?1
            "#,
        )
        .bind(purchase_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Records a purchase. The stock snapshot is left for the next replay.
    pub async fn insert(
        &self,
        product_name: &str,
        quantity: i64,
        date: DateTime<Utc>,
    ) -> DbResult<PurchaseRecord> {
        let record = PurchaseRecord {
            purchase_id: Uuid::new_v4().to_string(),
            product_name: product_name.to_string(),
            purchase_qty: quantity,
            date,
            created_at: Utc::now(),
            stock_after_purchase: None,
        };

        sqlx::query(
            r#"
            INSERT INTO purchase_history_with_stock
                (purchase_id, product_name, purchase_qty, date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&record.purchase_id)
        .bind(&record.product_name)
        .bind(record.purchase_qty)
        .bind(record.date)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// Reads up to `limit` rows; returns how many came back.
    pub async fn sample(&self, limit: i64) -> DbResult<usize> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT purchase_id FROM purchase_history_with_stock LIMIT ?1")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.len())
    }

    // =========================================================================
    // Transactional writes
    // =========================================================================

    /// Writes the balance right after a purchase.
    pub async fn set_stock_after(
        conn: &mut SqliteConnection,
        purchase_id: &str,
        stock_after: i64,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE purchase_history_with_stock SET stock_after_purchase = ?1 WHERE purchase_id = ?2",
        )
        .bind(stock_after)
        .bind(purchase_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes one purchase row.
    pub async fn delete(conn: &mut SqliteConnection, purchase_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM purchase_history_with_stock WHERE purchase_id = ?1")
            .bind(purchase_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
