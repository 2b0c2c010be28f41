//! # salon-core: Pure Business Logic for the Salon POS
//!
//! Everything in this crate is deterministic and free of I/O. The database
//! crate feeds it rows; it hands back balances and identifiers to persist.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Salon POS Reconciliation                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        devtools console  /  order lifecycle hooks               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │   salon-ops: Aggregator ─► Replayer        Sequencer            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ salon-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  ledger   │  │ sequence  │  │ validation│  │   │
//! │  │   │  Product  │  │  merge    │  │ year code │  │   rules   │  │   │
//! │  │   │  Order    │  │  replay   │  │ RNG / SC  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, ledger records, Order)
//! - [`ledger`] - Chronological merge and running-balance replay
//! - [`sequence`] - Order numbering: year codes, partitions, renumber plans
//! - [`money`] - Integer money for order totals
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation run before any I/O
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use salon_core::ledger::{replay, StockTransaction, TransactionKind};
//!
//! let day = |d| Utc.with_ymd_and_hms(2025, 4, d, 10, 0, 0).unwrap();
//! let ledger = vec![
//!     StockTransaction::new("p1", "Shampoo 200ml", 50, TransactionKind::Purchase, day(1), day(1)),
//!     StockTransaction::new("s1", "Shampoo 200ml", 20, TransactionKind::Sale, day(2), day(2)),
//! ];
//!
//! let result = replay(&ledger);
//! assert_eq!(result.final_stock, 30);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod sequence;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{StockReplay, StockTransaction, TransactionKind, TransactionRef};
pub use money::Money;
pub use sequence::{year_code, OrderCategory, OrderNumber};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Client name the front desk uses when booking product usage against the
/// salon itself. Legacy orders carrying it are salon-consumption orders.
pub const SALON_CONSUMPTION_CLIENT: &str = "Salon Consumption";

/// Maximum line items accepted on a single order.
pub const MAX_ORDER_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// Catches typos like 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum unit price, in paise (₹1 crore).
///
/// Keeps the largest possible order total well inside `i64`.
pub const MAX_UNIT_PRICE_CENTS: i64 = 1_000_000_000;
