//! # salon-ops: Reconciliation Services for the Salon POS
//!
//! Composes the pure logic in `salon-core` with the repositories in
//! `salon-db` into the passes the console and the order lifecycle run.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Reconciliation Services                          │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    OrderService (lifecycle)                      │  │
//! │  │   create_order / update_order / delete_order → OrderNotifier     │  │
//! │  └──────────────┬──────────────────────────────────┬────────────────┘  │
//! │                 │                                  │                    │
//! │                 ▼                                  ▼                    │
//! │  ┌──────────────────────────────┐   ┌──────────────────────────────┐   │
//! │  │        StockReplayer         │   │        OrderSequencer        │   │
//! │  │                              │   │                              │   │
//! │  │ per-product lock             │   │ one pass lock                │   │
//! │  │ replay → snapshots + stock   │   │ RNG / SC dense numbering     │   │
//! │  │ one tx per product           │   │ one tx per partition         │   │
//! │  └──────────────┬───────────────┘   └──────────────────────────────┘   │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  ┌──────────────────────────────┐                                      │
//! │  │    TransactionAggregator     │   purchases + sales + consumption    │
//! │  │  unreadable source → empty   │   → one chronological ledger         │
//! │  └──────────────────────────────┘                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`aggregator`] - Three-source ledger merge with degraded reads
//! - [`replayer`] - Running balances written back per product
//! - [`sequencer`] - Order numbering passes
//! - [`orders`] - Order create/update/delete
//! - [`notify`] - Client messaging seam
//! - [`diagnostics`] - Store self-test
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Service error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use salon_ops::{SalonConfig, StockReplayer};
//! use salon_db::Database;
//!
//! let config = SalonConfig::load_or_default(None);
//! let db = Database::new(config.db_config()).await?;
//!
//! let summary = StockReplayer::new(db).recalculate_all().await?;
//! println!("{} products updated", summary.updated.len());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregator;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod notify;
pub mod orders;
pub mod replayer;
pub mod sequencer;

// =============================================================================
// Re-exports
// =============================================================================

pub use aggregator::{ProductLedger, TransactionAggregator};
pub use config::{AutomationSettings, OrderEvent, SalonConfig};
pub use diagnostics::{self_test, SelfTestReport};
pub use error::{NotifyError, OpsError, OpsResult};
pub use notify::{LogNotifier, NoOpNotifier, OrderNotifier};
pub use orders::{CreatedOrder, DeletedOrder, OrderService, UpdatedOrder};
pub use replayer::{ProductRecalc, RecalcSummary, StockReplayer};
pub use sequencer::{MigrationReport, OrderSequencer, RenumberReport, RepairReport};
