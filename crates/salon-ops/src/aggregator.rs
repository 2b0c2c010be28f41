//! # Transaction Aggregator
//!
//! Builds one product's chronological stock ledger from the three source
//! tables.
//!
//! ## Degraded Reads
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  purchases   ── read ok ──────────┐                                    │
//! │  sales       ── read ok ──────────┼──► merge + sort ──► ProductLedger   │
//! │  consumption ── read FAILED ─ ∅ ──┘                     degraded = [    │
//! │                    │                                      consumption ] │
//! │                    └── warn!(..)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed source contributes no rows. The other sources still aggregate,
//! and the caller learns which sources were skipped through
//! [`ProductLedger::degraded`]. Nothing here writes.

use tracing::{debug, warn};

use salon_core::ledger::{merge, StockTransaction, TransactionKind};
use salon_core::validation::validate_product_name;
use salon_db::{Database, DbResult};

use crate::error::OpsResult;

/// One product's merged ledger.
#[derive(Debug, Clone, Default)]
pub struct ProductLedger {
    pub product_name: String,
    /// Entries in replay order.
    pub transactions: Vec<StockTransaction>,
    /// Sources whose read failed and were treated as empty.
    pub degraded: Vec<TransactionKind>,
}

impl ProductLedger {
    /// Returns true if every source was read.
    pub fn is_complete(&self) -> bool {
        self.degraded.is_empty()
    }
}

/// Reads and merges the three ledgers.
#[derive(Debug, Clone)]
pub struct TransactionAggregator {
    db: Database,
}

impl TransactionAggregator {
    pub fn new(db: Database) -> Self {
        TransactionAggregator { db }
    }

    /// Aggregates every transaction for `product_name`, matched exactly.
    ///
    /// ## Errors
    /// Only a blank product name fails, before any query runs. Read
    /// failures degrade to empty sources.
    pub async fn aggregate(&self, product_name: &str) -> OpsResult<ProductLedger> {
        validate_product_name(product_name)?;

        let mut degraded = Vec::new();

        let purchases = or_empty(
            self.db.purchases().list_for_product(product_name).await,
            TransactionKind::Purchase,
            product_name,
            &mut degraded,
        );
        let sales = or_empty(
            self.db.sales().list_for_product(product_name).await,
            TransactionKind::Sale,
            product_name,
            &mut degraded,
        );
        let consumption = or_empty(
            self.db.consumption().list_for_product(product_name).await,
            TransactionKind::Consumption,
            product_name,
            &mut degraded,
        );

        let transactions = merge(&purchases, &sales, &consumption);

        debug!(
            product = %product_name,
            purchases = purchases.len(),
            sales = sales.len(),
            consumption = consumption.len(),
            degraded = degraded.len(),
            "Aggregated ledger"
        );

        Ok(ProductLedger {
            product_name: product_name.to_string(),
            transactions,
            degraded,
        })
    }
}

fn or_empty<T>(
    result: DbResult<Vec<T>>,
    kind: TransactionKind,
    product_name: &str,
    degraded: &mut Vec<TransactionKind>,
) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            warn!(
                product = %product_name,
                source = %kind,
                error = %e,
                "Ledger source unreadable, treating as empty"
            );
            degraded.push(kind);
            Vec::new()
        }
    }
}
