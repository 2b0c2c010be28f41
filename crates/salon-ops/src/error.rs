//! # Ops Error Types
//!
//! Error types for reconciliation services and the order lifecycle.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Ops Error Categories                              │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Input         │  │     Store               │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Validation     │  │  Database               │ │
//! │  │  ConfigLoad     │  │  Core           │  │  SelfTestFailed         │ │
//! │  │  ConfigSave     │  │  NotFound       │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  NotifyError is separate: the order service logs it and moves on.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use salon_core::{CoreError, ValidationError};
use salon_db::DbError;

/// Result type alias for service operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Errors returned by salon-ops services.
#[derive(Debug, Error)]
pub enum OpsError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// Input rejected before any I/O.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Domain rule failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Order row does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Ledger row does not exist.
    #[error("{kind} not found: {id}")]
    TransactionNotFound { kind: String, id: String },

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// A table could not be read during the self-test.
    ///
    /// ## When This Occurs
    /// - Table dropped or renamed
    /// - Database file unreadable
    #[error("Self-test failed on {table}: {message}")]
    SelfTestFailed { table: String, message: String },
}

impl OpsError {
    /// Returns true if the caller sent bad input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            OpsError::Validation(_) | OpsError::Core(CoreError::Validation(_))
                | OpsError::Core(CoreError::TooManyItems { .. })
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            OpsError::InvalidConfig(_) | OpsError::ConfigLoadFailed(_) | OpsError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<sqlx::Error> for OpsError {
    fn from(err: sqlx::Error) -> Self {
        OpsError::Database(DbError::from(err))
    }
}

impl From<std::io::Error> for OpsError {
    fn from(err: std::io::Error) -> Self {
        OpsError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for OpsError {
    fn from(err: toml::de::Error) -> Self {
        OpsError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for OpsError {
    fn from(err: toml::ser::Error) -> Self {
        OpsError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Notify Error
// =============================================================================

/// Failure reported by an order notifier.
///
/// Never escapes the order service; it is logged at the call site.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The messaging provider rejected or failed the send.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Phone number the provider cannot deliver to.
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),
}
