//! # Salon Consumption Repository
//!
//! Stock-out ledger for products the salon uses itself
//! (`salon_consumption`).
//!
//! The table was imported from a spreadsheet and keeps its quoted column
//! names (`"Product Name"`, `"Consumption_Qty"`, `"Date"`). Every query here
//! aliases them to the snake_case fields of [`ConsumptionRecord`]; nothing
//! outside this file should ever see the quoted names.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use salon_core::ConsumptionRecord;

const CONSUMPTION_COLUMNS: &str = r#"
    id,
    "Product Name" AS product_name,
    "Consumption_Qty" AS consumption_qty,
    "Date" AS date,
    created_at,
    stock_after_consumption,
    order_ref
"#;

/// Repository for salon consumption operations.
#[derive(Debug, Clone)]
pub struct ConsumptionRepository {
    pool: SqlitePool,
}

impl ConsumptionRepository {
    /// Creates a new ConsumptionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ConsumptionRepository { pool }
    }

    /// All consumption of one product, by exact name.
    pub async fn list_for_product(&self, product_name: &str) -> DbResult<Vec<ConsumptionRecord>> {
        let rows = sqlx::query_as::<_, ConsumptionRecord>(&format!(
            r#"SELECT {CONSUMPTION_COLUMNS} FROM salon_consumption
               WHERE "Product Name" = ?1
               ORDER BY "Date", created_at, id"#
        ))
        .bind(product_name)
        .fetch_all(&self.pool)
        .await?;

        debug!(product = %product_name, count = rows.len(), "Loaded consumption");
        Ok(rows)
    }

    /// Consumption rows produced by one POS order.
    pub async fn list_for_order(&self, order_ref: &str) -> DbResult<Vec<ConsumptionRecord>> {
        let rows = sqlx::query_as::<_, ConsumptionRecord>(&format!(
            "SELECT {CONSUMPTION_COLUMNS} FROM salon_consumption WHERE order_ref = ?1 ORDER BY id"
        ))
        .bind(order_ref)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Gets a consumption row by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ConsumptionRecord>> {
        let row = sqlx::query_as::<_, ConsumptionRecord>(&format!(
            "SELECT {CONSUMPTION_COLUMNS} FROM salon_consumption WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Records consumption entered directly at the stock screen.
    pub async fn insert(
        &self,
        product_name: &str,
        quantity: i64,
        date: DateTime<Utc>,
    ) -> DbResult<ConsumptionRecord> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_with(&mut conn, product_name, quantity, date, None).await
    }

    /// Reads up to `limit` rows; returns how many came back.
    pub async fn sample(&self, limit: i64) -> DbResult<usize> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM salon_consumption LIMIT ?1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.len())
    }

    // =========================================================================
    // Transactional writes
    // =========================================================================

    /// Inserts a consumption row on the given connection.
    pub async fn insert_with(
        conn: &mut SqliteConnection,
        product_name: &str,
        quantity: i64,
        date: DateTime<Utc>,
        order_ref: Option<&str>,
    ) -> DbResult<ConsumptionRecord> {
        let record = ConsumptionRecord {
            id: Uuid::new_v4().to_string(),
            product_name: product_name.to_string(),
            consumption_qty: quantity,
            date,
            created_at: Utc::now(),
            stock_after_consumption: None,
            order_ref: order_ref.map(str::to_string),
        };

        sqlx::query(
            r#"
            INSERT INTO salon_consumption
                (id, "Product Name", "Consumption_Qty", "Date", created_at, order_ref)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.id)
        .bind(&record.product_name)
        .bind(record.consumption_qty)
        .bind(record.date)
        .bind(record.created_at)
        .bind(&record.order_ref)
        .execute(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Writes the balance right after a consumption.
    pub async fn set_stock_after(
        conn: &mut SqliteConnection,
        id: &str,
        stock_after: i64,
    ) -> DbResult<u64> {
        let result =
            sqlx::query("UPDATE salon_consumption SET stock_after_consumption = ?1 WHERE id = ?2")
                .bind(stock_after)
                .bind(id)
                .execute(&mut *conn)
                .await?;

        Ok(result.rows_affected())
    }

    /// Deletes one consumption row.
    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM salon_consumption WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Deletes every consumption row an order produced.
    pub async fn delete_for_order(conn: &mut SqliteConnection, order_ref: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM salon_consumption WHERE order_ref = ?1")
            .bind(order_ref)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
