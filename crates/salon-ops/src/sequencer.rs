//! # Order Sequencer
//!
//! Keeps order identifiers dense per partition.
//!
//! ## Partitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  created_at ──────────────────────────────────────────────────────►     │
//! │                                                                         │
//! │  orders:   S   S   C   S   C   S   S                                    │
//! │                                                                         │
//! │  sales:    RNG0001/2526  RNG0002/2526  RNG0003/2526 ...                 │
//! │  salon:    SC0001/2526   SC0002/2526                                    │
//! │                                                                         │
//! │  Each partition counts from 1 by (created_at, id).                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Passes
//! | Pass                      | Touches                                    |
//! |---------------------------|--------------------------------------------|
//! | `renumber_all`            | every order, one transaction per partition |
//! | `migrate_order_ids`       | backfills categories, then `renumber_all`  |
//! | `renumber_after_deletion` | orders at or after the deleted one         |
//! | `repair_order_ids`        | partitions holding a broken identifier     |
//!
//! Passes share one lock, so two never interleave. Plans come from
//! `salon_core::sequence`; this module only reads orders and writes the
//! assignments back.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use salon_core::sequence::{
    fallback_order_id, needs_repair, next_order_number, plan_after_deletion, plan_partition,
    NumberAssignment, OrderCategory, SequencedOrder,
};
use salon_core::Order;
use salon_db::{commit, Database, DbResult, OrderRepository};

use crate::error::OpsResult;

// =============================================================================
// Reports
// =============================================================================

/// Result of renumbering one partition.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionOutcome {
    pub category: OrderCategory,
    /// Orders covered by the plan.
    pub orders: usize,
    /// Orders whose stored identifier actually changed.
    pub changed: usize,
}

/// A partition whose transaction rolled back.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionFailure {
    pub category: OrderCategory,
    pub error: String,
}

/// Result of a renumbering pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenumberReport {
    pub partitions: Vec<PartitionOutcome>,
    pub failed: Vec<PartitionFailure>,
}

impl RenumberReport {
    pub fn total_orders(&self) -> usize {
        self.partitions.iter().map(|p| p.orders).sum()
    }

    pub fn total_changed(&self) -> usize {
        self.partitions.iter().map(|p| p.changed).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, category: OrderCategory, result: DbResult<PartitionOutcome>) {
        match result {
            Ok(outcome) => self.partitions.push(outcome),
            Err(e) => {
                error!(category = %category, error = %e, "Partition renumbering rolled back");
                self.failed.push(PartitionFailure {
                    category,
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Result of the order ID migration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    /// Legacy orders that received an explicit category.
    pub categorized: usize,
    pub renumber: RenumberReport,
}

/// Result of the fallback repair pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepairReport {
    /// Orders whose identifier was missing, malformed or fallback-shaped.
    pub flagged: usize,
    pub renumber: RenumberReport,
}

// =============================================================================
// Order Sequencer
// =============================================================================

/// Assigns and maintains order identifiers.
#[derive(Debug, Clone)]
pub struct OrderSequencer {
    db: Database,
    pass_lock: Arc<Mutex<()>>,
}

impl OrderSequencer {
    pub fn new(db: Database) -> Self {
        OrderSequencer {
            db,
            pass_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The identifier the next order in `category` should receive.
    ///
    /// Counts the partition and returns `count + 1` with the current year
    /// code. If the count cannot be read, returns a timestamp-derived
    /// identifier instead; [`repair_order_ids`](Self::repair_order_ids)
    /// replaces those later.
    pub async fn next_order_id(&self, category: OrderCategory) -> String {
        let now = Utc::now();
        match self.count_partition(category).await {
            Ok(existing) => next_order_number(category, existing, now).to_string(),
            Err(e) => {
                let fallback = fallback_order_id(category, now);
                warn!(
                    category = %category,
                    error = %e,
                    fallback = %fallback,
                    "Order count unavailable, using fallback identifier"
                );
                fallback
            }
        }
    }

    async fn count_partition(&self, category: OrderCategory) -> DbResult<u64> {
        let orders = self.db.orders().list_all().await?;
        Ok(orders.iter().filter(|o| o.category() == category).count() as u64)
    }

    /// Renumbers both partitions densely from 1.
    pub async fn renumber_all(&self) -> OpsResult<RenumberReport> {
        let _guard = self.pass_lock.lock().await;
        self.renumber_all_locked().await
    }

    /// Gives every legacy order an explicit category, then renumbers.
    pub async fn migrate_order_ids(&self) -> OpsResult<MigrationReport> {
        let _guard = self.pass_lock.lock().await;

        let legacy = self.db.orders().list_uncategorized().await?;
        info!(count = legacy.len(), "Backfilling order categories");

        let mut tx = self.db.begin().await?;
        for order in &legacy {
            OrderRepository::set_category(&mut tx, &order.id, order.category()).await?;
        }
        commit(tx).await?;

        let renumber = self.renumber_all_locked().await?;
        Ok(MigrationReport {
            categorized: legacy.len(),
            renumber,
        })
    }

    /// Closes the gap a deleted order left in its partition.
    ///
    /// `deleted` is the order as it was before deletion. Orders created
    /// strictly before it keep their numbers; the rest shift down to
    /// follow on from them.
    pub async fn renumber_after_deletion(
        &self,
        deleted: &SequencedOrder,
    ) -> OpsResult<PartitionOutcome> {
        let _guard = self.pass_lock.lock().await;
        self.renumber_after_deletion_locked(deleted).await
    }

    /// Holds off every pass until the guard drops. The order service keeps
    /// it across "read next id, insert order" so two new orders cannot draw
    /// the same number.
    pub(crate) async fn hold(&self) -> MutexGuard<'_, ()> {
        self.pass_lock.lock().await
    }

    /// Caller holds the pass lock.
    pub(crate) async fn renumber_after_deletion_locked(
        &self,
        deleted: &SequencedOrder,
    ) -> OpsResult<PartitionOutcome> {
        let orders = self.db.orders().list_all().await?;
        let partition: Vec<&Order> = orders
            .iter()
            .filter(|o| o.category() == deleted.category && o.id != deleted.id)
            .collect();

        let preceding = partition
            .iter()
            .filter(|o| o.created_at < deleted.created_at)
            .count() as u64;
        let subsequent: Vec<SequencedOrder> = partition
            .iter()
            .filter(|o| o.created_at >= deleted.created_at)
            .map(|o| o.sequenced())
            .collect();

        let plan = plan_after_deletion(deleted, preceding, &subsequent);
        debug!(
            category = %deleted.category,
            preceding,
            renumbering = plan.len(),
            "Renumbering after deletion"
        );

        let outcome = self.apply(deleted.category, &plan, &orders).await.map_err(|e| {
            error!(category = %deleted.category, error = %e, "Post-deletion renumbering rolled back");
            e
        })?;
        Ok(outcome)
    }

    /// Renumbers each partition that holds a missing, malformed or
    /// fallback identifier. Clean partitions are left alone.
    pub async fn repair_order_ids(&self) -> OpsResult<RepairReport> {
        let _guard = self.pass_lock.lock().await;

        let orders = self.db.orders().list_all().await?;
        let sequenced: Vec<SequencedOrder> = orders.iter().map(Order::sequenced).collect();

        let mut report = RepairReport::default();
        for category in OrderCategory::ALL {
            let broken = orders
                .iter()
                .filter(|o| o.category() == category)
                .filter(|o| {
                    needs_repair(o.order_id.as_deref(), category)
                        || o.order_id != o.invoice_number
                })
                .count();
            if broken == 0 {
                continue;
            }

            warn!(category = %category, broken, "Repairing order identifiers");
            report.flagged += broken;
            let plan = plan_partition(&sequenced, category);
            let result = self.apply(category, &plan, &orders).await;
            report.renumber.record(category, result);
        }

        Ok(report)
    }

    /// Caller holds the pass lock.
    async fn renumber_all_locked(&self) -> OpsResult<RenumberReport> {
        let orders = self.db.orders().list_all().await?;
        let sequenced: Vec<SequencedOrder> = orders.iter().map(Order::sequenced).collect();
        info!(count = orders.len(), "Renumbering all orders");

        let mut report = RenumberReport::default();
        for category in OrderCategory::ALL {
            let plan = plan_partition(&sequenced, category);
            let result = self.apply(category, &plan, &orders).await;
            report.record(category, result);
        }

        info!(
            orders = report.total_orders(),
            changed = report.total_changed(),
            failed = report.failed.len(),
            "Renumbering finished"
        );
        Ok(report)
    }

    /// Writes one partition's plan in a single transaction, skipping rows
    /// that already carry their number.
    async fn apply(
        &self,
        category: OrderCategory,
        plan: &[NumberAssignment],
        current: &[Order],
    ) -> DbResult<PartitionOutcome> {
        let by_id: HashMap<&str, &Order> = current.iter().map(|o| (o.id.as_str(), o)).collect();

        let mut changed = 0;
        let mut tx = self.db.begin().await?;
        for assignment in plan {
            let number = assignment.number.to_string();
            let unchanged = by_id
                .get(assignment.order_id.as_str())
                .is_some_and(|o| o.has_number(&number));
            if unchanged {
                continue;
            }
            OrderRepository::set_number(&mut tx, &assignment.order_id, &number).await?;
            changed += 1;
        }
        commit(tx).await?;

        debug!(category = %category, orders = plan.len(), changed, "Partition renumbered");
        Ok(PartitionOutcome {
            category,
            orders: plan.len(),
            changed,
        })
    }
}
