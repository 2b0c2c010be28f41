//! # Stock Ledger
//!
//! Merges the three stock-moving record types into one chronological ledger
//! and replays it into running balances.
//!
//! ## Replay
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  purchases ─┐                                                           │
//! │  sales ─────┼─► merge + sort ─► replay from 0 ─► balance per entry      │
//! │  consumption┘   (date, created_at, kind, id)      + final stock         │
//! │                                                                         │
//! │  "Shampoo 200ml"                                                        │
//! │  day 1  purchase  +50  │  50                                            │
//! │  day 2  sale      -20  │  30                                            │
//! │  day 3  purchase  +30  │  60                                            │
//! │  day 4  consumption -5 │  55  ← final stock                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! Entries sort by business `date`, then `created_at`, then kind
//! (purchase before sale before consumption), then id. Two transactions on
//! the same day therefore always replay in the same order, and a purchase
//! booked the same morning as a sale is counted before it.
//!
//! The replay never clamps: a ledger that sells more than it bought produces
//! a negative balance, which is exactly what the stock screens need to flag.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{ConsumptionRecord, PurchaseRecord, SaleRecord};

// =============================================================================
// Transaction Kind
// =============================================================================

/// Which ledger a transaction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    Sale,
    Consumption,
}

impl TransactionKind {
    /// Tie-break rank within the same date and creation time.
    pub const fn rank(&self) -> u8 {
        match self {
            TransactionKind::Purchase => 0,
            TransactionKind::Sale => 1,
            TransactionKind::Consumption => 2,
        }
    }

    /// Signed stock effect of `quantity` units.
    #[inline]
    pub const fn signed(&self, quantity: i64) -> i64 {
        match self {
            TransactionKind::Purchase => quantity,
            TransactionKind::Sale | TransactionKind::Consumption => -quantity,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "purchase",
            TransactionKind::Sale => "sale",
            TransactionKind::Consumption => "consumption",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Stock Transaction
// =============================================================================

/// Identifies one physical ledger row.
///
/// Ids are only unique within their own table, so the kind is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionRef {
    pub kind: TransactionKind,
    pub id: String,
}

impl TransactionRef {
    pub fn new(kind: TransactionKind, id: impl Into<String>) -> Self {
        TransactionRef { kind, id: id.into() }
    }
}

/// One entry of the merged ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockTransaction {
    /// Row id in the source table.
    pub id: String,
    pub product_name: String,
    /// Unsigned quantity as stored; the kind decides the sign.
    pub quantity: i64,
    pub kind: TransactionKind,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl StockTransaction {
    pub fn new(
        id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: i64,
        kind: TransactionKind,
        date: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        StockTransaction {
            id: id.into(),
            product_name: product_name.into(),
            quantity,
            kind,
            date,
            created_at,
        }
    }

    /// Signed stock effect of this entry.
    #[inline]
    pub fn delta(&self) -> i64 {
        self.kind.signed(self.quantity)
    }

    pub fn reference(&self) -> TransactionRef {
        TransactionRef::new(self.kind, self.id.clone())
    }

    /// Returns true if this entry is the row `r` points at.
    pub fn is(&self, r: &TransactionRef) -> bool {
        self.kind == r.kind && self.id == r.id
    }

    /// Ledger ordering.
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.kind.rank().cmp(&other.kind.rank()))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl From<&PurchaseRecord> for StockTransaction {
    fn from(r: &PurchaseRecord) -> Self {
        StockTransaction::new(
            r.purchase_id.clone(),
            r.product_name.clone(),
            r.purchase_qty,
            TransactionKind::Purchase,
            r.date,
            r.created_at,
        )
    }
}

impl From<&SaleRecord> for StockTransaction {
    fn from(r: &SaleRecord) -> Self {
        StockTransaction::new(
            r.sale_id.clone(),
            r.product_name.clone(),
            r.quantity,
            TransactionKind::Sale,
            r.date,
            r.created_at,
        )
    }
}

impl From<&ConsumptionRecord> for StockTransaction {
    fn from(r: &ConsumptionRecord) -> Self {
        StockTransaction::new(
            r.id.clone(),
            r.product_name.clone(),
            r.consumption_qty,
            TransactionKind::Consumption,
            r.date,
            r.created_at,
        )
    }
}

// =============================================================================
// Merge
// =============================================================================

/// Sorts a ledger into replay order.
pub fn sort_ledger(ledger: &mut [StockTransaction]) {
    ledger.sort_by(StockTransaction::chronological_cmp);
}

/// Merges the three record sets into one sorted ledger.
pub fn merge(
    purchases: &[PurchaseRecord],
    sales: &[SaleRecord],
    consumption: &[ConsumptionRecord],
) -> Vec<StockTransaction> {
    let mut ledger: Vec<StockTransaction> = purchases
        .iter()
        .map(StockTransaction::from)
        .chain(sales.iter().map(StockTransaction::from))
        .chain(consumption.iter().map(StockTransaction::from))
        .collect();
    sort_ledger(&mut ledger);
    ledger
}

// =============================================================================
// Replay
// =============================================================================

/// A ledger entry with the balance right after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReplayEntry {
    pub transaction: StockTransaction,
    /// Balance before this entry.
    pub stock_before: i64,
    /// Balance after this entry.
    pub stock_after: i64,
}

/// Per-kind quantity totals of a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerTotals {
    pub purchased: i64,
    pub sold: i64,
    pub consumed: i64,
}

impl LedgerTotals {
    /// Purchases minus sales minus consumption.
    pub fn net(&self) -> i64 {
        self.purchased - self.sold - self.consumed
    }

    fn add(&mut self, tx: &StockTransaction) {
        match tx.kind {
            TransactionKind::Purchase => self.purchased += tx.quantity,
            TransactionKind::Sale => self.sold += tx.quantity,
            TransactionKind::Consumption => self.consumed += tx.quantity,
        }
    }
}

/// Result of replaying one product's ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockReplay {
    /// Entries in replay order.
    pub entries: Vec<ReplayEntry>,
    pub final_stock: i64,
    pub totals: LedgerTotals,
}

impl StockReplay {
    /// Balance after the entry `r` points at, if it is in the ledger.
    pub fn stock_after(&self, r: &TransactionRef) -> Option<i64> {
        self.entries
            .iter()
            .find(|e| e.transaction.is(r))
            .map(|e| e.stock_after)
    }
}

/// Replays a ledger from zero.
///
/// The input is sorted into ledger order first, so callers may pass the
/// entries in any order.
pub fn replay(ledger: &[StockTransaction]) -> StockReplay {
    let mut ordered = ledger.to_vec();
    sort_ledger(&mut ordered);

    let mut balance = 0_i64;
    let mut totals = LedgerTotals::default();
    let entries = ordered
        .into_iter()
        .map(|tx| {
            let stock_before = balance;
            balance += tx.delta();
            totals.add(&tx);
            ReplayEntry {
                transaction: tx,
                stock_before,
                stock_after: balance,
            }
        })
        .collect();

    StockReplay {
        entries,
        final_stock: balance,
        totals,
    }
}

/// Replays a ledger with one transaction left out.
///
/// Used right after that transaction's row was deleted, when a store read
/// may still return it.
pub fn replay_excluding(ledger: &[StockTransaction], excluded: &TransactionRef) -> StockReplay {
    let filtered: Vec<StockTransaction> =
        ledger.iter().filter(|tx| !tx.is(excluded)).cloned().collect();
    replay(&filtered)
}

// =============================================================================
// Unit Tests
// =============================================================================
