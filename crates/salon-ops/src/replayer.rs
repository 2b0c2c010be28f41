//! # Stock Replayer
//!
//! Recomputes running balances for a product and writes them back.
//!
//! ## One Product, One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  recalculate_product("Shampoo 200ml")                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock("Shampoo 200ml")          ← same-product passes queue here        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  aggregate → replay (salon-core)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    stock_after_purchase      per purchase                               │
//! │    current/remaining_stock   per sale                                   │
//! │    stock_after_consumption   per consumption                            │
//! │    product_master.stock_quantity                                        │
//! │  COMMIT                         ← all or nothing                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Different products recalculate independently; `recalculate_all` walks
//! them one by one and keeps going past a failed product.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use salon_core::ledger::{
    replay, replay_excluding, LedgerTotals, StockReplay, TransactionKind, TransactionRef,
};
use salon_core::validation::validate_product_name;
use salon_db::{
    commit, ConsumptionRepository, Database, DbResult, ProductRepository, PurchaseRepository,
    SaleRepository,
};

use crate::aggregator::TransactionAggregator;
use crate::error::{OpsError, OpsResult};

// =============================================================================
// Results
// =============================================================================

/// Outcome of recalculating one product.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRecalc {
    pub product_name: String,
    pub final_stock: i64,
    pub totals: LedgerTotals,
    /// Ledger rows replayed.
    pub transactions: usize,
    /// Sources skipped because their read failed.
    pub degraded: Vec<TransactionKind>,
    /// False if no product master row carries this name.
    pub product_found: bool,
}

/// A product the bulk pass could not recalculate.
#[derive(Debug, Clone, Serialize)]
pub struct RecalcFailure {
    pub product_name: String,
    pub error: String,
}

/// Outcome of `recalculate_all`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecalcSummary {
    pub updated: Vec<ProductRecalc>,
    pub failed: Vec<RecalcFailure>,
}

impl RecalcSummary {
    /// Returns true if every product recalculated from complete sources.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.updated.iter().all(|p| p.degraded.is_empty())
    }

    /// Final stock of one product, if it was updated.
    pub fn stock_of(&self, product_name: &str) -> Option<i64> {
        self.updated
            .iter()
            .find(|p| p.product_name == product_name)
            .map(|p| p.final_stock)
    }
}

// =============================================================================
// Stock Replayer
// =============================================================================

/// Per-product keyed locks.
type ProductLocks = Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>;

/// Recalculates and persists product stock.
///
/// Clones share the same lock table, so hand clones to every caller that
/// may recalculate concurrently.
#[derive(Debug, Clone)]
pub struct StockReplayer {
    db: Database,
    aggregator: TransactionAggregator,
    locks: ProductLocks,
}

impl StockReplayer {
    pub fn new(db: Database) -> Self {
        StockReplayer {
            aggregator: TransactionAggregator::new(db.clone()),
            db,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Lock for one product name. Entries nobody holds are pruned on the
    /// way in, so the table only grows with concurrent product passes.
    async fn lock_for(&self, product_name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(product_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Rebuilds one product's snapshots and stock from its full ledger.
    pub async fn recalculate_product(&self, product_name: &str) -> OpsResult<ProductRecalc> {
        validate_product_name(product_name)?;

        let lock = self.lock_for(product_name).await;
        let _guard = lock.lock().await;

        self.recalculate_locked(product_name, None).await
    }

    /// Like [`recalculate_product`](Self::recalculate_product), with one
    /// transaction left out of the replay.
    ///
    /// Used right after that transaction was deleted, so a read that still
    /// sees the row cannot count it.
    pub async fn recalculate_product_excluding(
        &self,
        product_name: &str,
        excluded: &TransactionRef,
    ) -> OpsResult<ProductRecalc> {
        validate_product_name(product_name)?;

        let lock = self.lock_for(product_name).await;
        let _guard = lock.lock().await;

        self.recalculate_locked(product_name, Some(excluded)).await
    }

    /// Recalculates every active product.
    ///
    /// A product that fails is logged and listed in
    /// [`RecalcSummary::failed`]; the pass continues with the next one.
    pub async fn recalculate_all(&self) -> OpsResult<RecalcSummary> {
        let products = self.db.products().list_active().await?;
        info!(count = products.len(), "Starting full stock recalculation");

        let mut summary = RecalcSummary::default();
        for product in products {
            match self.recalculate_product(&product.name).await {
                Ok(result) => summary.updated.push(result),
                Err(e) => {
                    error!(product = %product.name, error = %e, "Stock recalculation failed");
                    summary.failed.push(RecalcFailure {
                        product_name: product.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            updated = summary.updated.len(),
            failed = summary.failed.len(),
            "Full stock recalculation finished"
        );
        Ok(summary)
    }

    /// Deletes one ledger row and recalculates its product without it.
    pub async fn remove_transaction(&self, target: &TransactionRef) -> OpsResult<ProductRecalc> {
        let product_name = self.product_of(target).await?;

        let lock = self.lock_for(&product_name).await;
        let _guard = lock.lock().await;

        let mut tx = self.db.begin().await?;
        match target.kind {
            TransactionKind::Purchase => PurchaseRepository::delete(&mut tx, &target.id).await?,
            TransactionKind::Sale => SaleRepository::delete(&mut tx, &target.id).await?,
            TransactionKind::Consumption => {
                ConsumptionRepository::delete(&mut tx, &target.id).await?
            }
        };
        commit(tx).await?;

        info!(kind = %target.kind, id = %target.id, product = %product_name, "Deleted ledger row");
        self.recalculate_locked(&product_name, Some(target)).await
    }

    async fn product_of(&self, target: &TransactionRef) -> OpsResult<String> {
        let name = match target.kind {
            TransactionKind::Purchase => self
                .db
                .purchases()
                .get_by_id(&target.id)
                .await?
                .map(|r| r.product_name),
            TransactionKind::Sale => self
                .db
                .sales()
                .get_by_id(&target.id)
                .await?
                .map(|r| r.product_name),
            TransactionKind::Consumption => self
                .db
                .consumption()
                .get_by_id(&target.id)
                .await?
                .map(|r| r.product_name),
        };

        name.ok_or_else(|| OpsError::TransactionNotFound {
            kind: target.kind.to_string(),
            id: target.id.clone(),
        })
    }

    /// Caller holds the product lock.
    async fn recalculate_locked(
        &self,
        product_name: &str,
        excluded: Option<&TransactionRef>,
    ) -> OpsResult<ProductRecalc> {
        let ledger = self.aggregator.aggregate(product_name).await?;
        if !ledger.is_complete() {
            warn!(
                product = %product_name,
                degraded = ?ledger.degraded,
                "Recalculating from incomplete ledger"
            );
        }

        let result = match excluded {
            Some(r) => replay_excluding(&ledger.transactions, r),
            None => replay(&ledger.transactions),
        };

        let product_found = self.persist(product_name, &result).await.map_err(|e| {
            error!(product = %product_name, error = %e, "Stock write rolled back");
            e
        })?;

        debug!(
            product = %product_name,
            final_stock = result.final_stock,
            entries = result.entries.len(),
            "Product stock recalculated"
        );

        Ok(ProductRecalc {
            product_name: product_name.to_string(),
            final_stock: result.final_stock,
            totals: result.totals,
            transactions: result.entries.len(),
            degraded: ledger.degraded,
            product_found,
        })
    }

    /// Writes every snapshot plus the product stock in one transaction.
    /// Returns whether a product master row was updated.
    async fn persist(&self, product_name: &str, result: &StockReplay) -> DbResult<bool> {
        let mut tx = self.db.begin().await?;

        for entry in &result.entries {
            let id = entry.transaction.id.as_str();
            match entry.transaction.kind {
                TransactionKind::Purchase => {
                    PurchaseRepository::set_stock_after(&mut tx, id, entry.stock_after).await?;
                }
                TransactionKind::Sale => {
                    SaleRepository::set_stock_after(&mut tx, id, entry.stock_after).await?;
                }
                TransactionKind::Consumption => {
                    ConsumptionRepository::set_stock_after(&mut tx, id, entry.stock_after).await?;
                }
            }
        }

        let touched = ProductRepository::set_stock(&mut tx, product_name, result.final_stock).await?;
        commit(tx).await?;

        if touched == 0 {
            warn!(product = %product_name, "No product master row for ledger name");
        }
        Ok(touched > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use salon_db::DbConfig;

    const SHAMPOO: &str = "Shampoo 200ml";
    const SERUM: &str = "Keratin Serum";

    async fn stocked_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let day = |d| Utc.with_ymd_and_hms(2025, 6, d, 12, 0, 0).unwrap();
        for name in [SHAMPOO, SERUM] {
            db.products().insert(name, 0).await.unwrap();
            db.purchases().insert(name, 50, day(1)).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_same_product_waits_for_lock() {
        let db = stocked_db().await;
        let replayer = StockReplayer::new(db.clone());

        let lock = replayer.lock_for(SHAMPOO).await;
        let guard = lock.lock().await;

        let queued = tokio::spawn({
            let replayer = replayer.clone();
            async move { replayer.recalculate_product(SHAMPOO).await }
        });
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert!(!queued.is_finished());

        // other products are not blocked
        let serum = replayer.recalculate_product(SERUM).await.unwrap();
        assert_eq!(serum.final_stock, 50);

        // the queued pass reads the ledger only once it holds the lock
        let day = Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap();
        db.sales().insert(SHAMPOO, 8, day).await.unwrap();
        drop(guard);

        let result = queued.await.unwrap().unwrap();
        assert_eq!(result.final_stock, 42);
        let product = db.products().get_by_name(SHAMPOO).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 42);
    }

    #[tokio::test]
    async fn test_idle_locks_are_pruned() {
        let db = stocked_db().await;
        let replayer = StockReplayer::new(db);

        replayer.recalculate_product(SHAMPOO).await.unwrap();
        replayer.recalculate_product(SERUM).await.unwrap();
        replayer.recalculate_all().await.unwrap();

        let held = replayer.lock_for(SHAMPOO).await;
        let locks = replayer.locks.lock().await;
        assert_eq!(locks.len(), 1);
        assert!(locks.contains_key(SHAMPOO));
        drop(locks);
        drop(held);
    }
}
