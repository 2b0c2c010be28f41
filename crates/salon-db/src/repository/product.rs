//! # Product Repository
//!
//! Database operations for the product master.
//!
//! ## Who Writes What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  product_master                                                         │
//! │                                                                         │
//! │  insert()        ← seed tool, tests, stock screens                      │
//! │  set_stock()     ← Stock Replayer only, inside its per-product tx       │
//! │  list_active()   ← recalculate_all()                                    │
//! │  sample()        ← self-test                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use salon_core::Product;

const PRODUCT_COLUMNS: &str =
    "id, name, stock_quantity, active, created_at, updated_at";

/// Repository for product master operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its exact name.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product_master WHERE name = ?1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product_master WHERE active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed active products");
        Ok(products)
    }

    /// Inserts a product with an opening stock figure.
    ///
    /// The opening figure is only a cache; the next replay overwrites it
    /// from the ledgers.
    pub async fn insert(&self, name: &str, stock_quantity: i64) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            stock_quantity,
            active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO product_master (id, name, stock_quantity, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.stock_quantity)
        .bind(product.active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.name),
            other => other,
        })?;

        debug!(name = %product.name, "Inserted product");
        Ok(product)
    }

    /// Marks a product active or inactive.
    pub async fn set_active(&self, name: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE product_master SET active = ?1, updated_at = ?2 WHERE name = ?3",
        )
        .bind(active)
        .bind(Utc::now())
        .bind(name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", name));
        }
        Ok(())
    }

    /// Number of products in the master.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_master")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Reads up to `limit` rows; returns how many came back.
    pub async fn sample(&self, limit: i64) -> DbResult<usize> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM product_master LIMIT ?1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.len())
    }

    // =========================================================================
    // Transactional writes
    // =========================================================================

    /// Writes the replayed stock figure onto the product.
    ///
    /// Returns the number of rows touched (0 if the name has no product).
    pub async fn set_stock(
        conn: &mut SqliteConnection,
        name: &str,
        stock_quantity: i64,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE product_master SET stock_quantity = ?1, updated_at = ?2 WHERE name = ?3",
        )
        .bind(stock_quantity)
        .bind(Utc::now())
        .bind(name)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }
}
