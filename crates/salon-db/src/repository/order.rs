//! # Order Repository
//!
//! Database operations for POS orders and their line items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── insert_with() + insert_item_with()   (one transaction)          │
//! │                                                                         │
//! │  2. (OPTIONAL) UPDATE                                                  │
//! │     └── update() → status, payment method, phone, notes                 │
//! │                                                                         │
//! │  3. (OPTIONAL) DELETE                                                  │
//! │     └── delete_items() + delete()             (one transaction)         │
//! │                                                                         │
//! │  Any time: set_number() from a renumbering pass                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `order_id` and `invoice_number` are always written together.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use salon_core::{Order, OrderCategory, OrderDetail, OrderItem, OrderUpdate};

const ORDER_COLUMNS: &str = r#"
    id,
    order_id,
    invoice_number,
    client_name,
    client_phone,
    order_category,
    is_salon_consumption,
    type AS order_type,
    consumption_purpose,
    total_cents,
    payment_method,
    status,
    notes,
    created_at,
    updated_at
"#;

const ITEM_COLUMNS: &str =
    "id, pos_order_id, item_name, item_type, product_name, quantity, unit_price_cents, created_at";

/// Repository for POS order operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an order by row ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM pos_orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Line items of an order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM pos_order_items WHERE pos_order_id = ?1 ORDER BY created_at, id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// An order with its items.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<OrderDetail>> {
        let Some(order) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.get_items(id).await?;
        Ok(Some(OrderDetail { order, items }))
    }

    /// Every order, oldest first with ties broken by id.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM pos_orders ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = orders.len(), "Listed orders");
        Ok(orders)
    }

    /// Orders written before the category column existed.
    pub async fn list_uncategorized(&self) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM pos_orders WHERE order_category IS NULL ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Reads up to `limit` rows; returns how many came back.
    pub async fn sample(&self, limit: i64) -> DbResult<usize> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM pos_orders LIMIT ?1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.len())
    }

    // =========================================================================
    // Pool writes
    // =========================================================================

    /// Inserts an order row exactly as given. Used by imports and the seed
    /// tool; new orders go through the order service.
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_with(&mut conn, order).await
    }

    /// Applies a partial update and returns the updated order.
    pub async fn update(&self, id: &str, update: &OrderUpdate) -> DbResult<Order> {
        let result = sqlx::query(
            r#"
            UPDATE pos_orders SET
                status = COALESCE(?1, status),
                payment_method = COALESCE(?2, payment_method),
                client_phone = COALESCE(?3, client_phone),
                notes = COALESCE(?4, notes),
                updated_at = ?5
            WHERE id = ?6
            "#,
        )
        .bind(update.status)
        .bind(update.payment_method)
        .bind(&update.client_phone)
        .bind(&update.notes)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    // =========================================================================
    // Transactional writes
    // =========================================================================

    /// Inserts an order row on the given connection.
    pub async fn insert_with(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pos_orders (
                id, order_id, invoice_number, client_name, client_phone,
                order_category, is_salon_consumption, type, consumption_purpose,
                total_cents, payment_method, status, notes, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_id)
        .bind(&order.invoice_number)
        .bind(&order.client_name)
        .bind(&order.client_phone)
        .bind(order.order_category)
        .bind(order.is_salon_consumption)
        .bind(&order.order_type)
        .bind(&order.consumption_purpose)
        .bind(order.total_cents)
        .bind(order.payment_method)
        .bind(order.status)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        debug!(id = %order.id, order_id = ?order.order_id, "Inserted order");
        Ok(())
    }

    /// Inserts a line item on the given connection.
    pub async fn insert_item_with(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pos_order_items (
                id, pos_order_id, item_name, item_type, product_name,
                quantity, unit_price_cents, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.pos_order_id)
        .bind(&item.item_name)
        .bind(item.item_type)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Writes an identifier to both `order_id` and `invoice_number`.
    pub async fn set_number(conn: &mut SqliteConnection, id: &str, number: &str) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE pos_orders SET order_id = ?1, invoice_number = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(number)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Stores an explicit category on a legacy row.
    pub async fn set_category(
        conn: &mut SqliteConnection,
        id: &str,
        category: OrderCategory,
    ) -> DbResult<u64> {
        let result = sqlx::query("UPDATE pos_orders SET order_category = ?1 WHERE id = ?2")
            .bind(category)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes the line items of an order.
    pub async fn delete_items(conn: &mut SqliteConnection, id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM pos_order_items WHERE pos_order_id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Deletes the order row.
    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM pos_orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
