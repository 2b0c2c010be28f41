//! # Diagnostics
//!
//! Store self-test run from the developer console.
//!
//! Reads at most one row from each table the reconciliation passes depend
//! on, in the order below, and stops at the first table that fails.
//!
//! ```text
//! purchase_history_with_stock → sales_history → salon_consumption → product_master
//! ```

use serde::Serialize;
use tracing::{error, info};

use salon_db::{Database, DbResult};

use crate::error::{OpsError, OpsResult};

/// Rows sampled from each table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelfTestReport {
    pub success: bool,
    pub message: String,
    pub purchase_records: usize,
    pub sales_records: usize,
    pub consumption_records: usize,
    pub product_records: usize,
}

/// Checks that every ledger table and the product master can be read.
///
/// ## Errors
/// [`OpsError::SelfTestFailed`] naming the first unreadable table.
pub async fn self_test(db: &Database) -> OpsResult<SelfTestReport> {
    let purchase_records = probe("purchase_history_with_stock", db.purchases().sample(1).await)?;
    let sales_records = probe("sales_history", db.sales().sample(1).await)?;
    let consumption_records = probe("salon_consumption", db.consumption().sample(1).await)?;
    let product_records = probe("product_master", db.products().sample(1).await)?;

    let report = SelfTestReport {
        success: true,
        message: "All stock tables readable".to_string(),
        purchase_records,
        sales_records,
        consumption_records,
        product_records,
    };
    info!(?report, "Self-test passed");
    Ok(report)
}

fn probe(table: &str, result: DbResult<usize>) -> OpsResult<usize> {
    result.map_err(|e| {
        error!(table, error = %e, "Self-test failed");
        OpsError::SelfTestFailed {
            table: table.to_string(),
            message: e.to_string(),
        }
    })
}
