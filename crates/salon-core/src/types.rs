//! # Domain Types
//!
//! Core domain types used throughout the salon POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │ PurchaseRecord  │   │   SaleRecord    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name (unique)  │   │  purchase_qty   │   │  quantity       │       │
//! │  │  stock_quantity │   │  stock_after_   │   │  current_stock  │       │
//! │  │  active         │   │    purchase     │   │  remaining_stock│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ConsumptionRecord│   │     Order       │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  consumption_qty│   │  order_id       │   │  item_type      │       │
//! │  │  stock_after_   │   │  order_category │   │  product_name   │       │
//! │  │    consumption  │   │  status         │   │  quantity       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Product Identity
//! Ledger rows reference products by exact `name`, not by id. Renaming a
//! product detaches its history, so names are treated as immutable keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::sequence::{classify_legacy, LegacyOrderFlags, OrderCategory, SequencedOrder};

// =============================================================================
// Product
// =============================================================================

/// A product tracked in the product master.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name. Also the join key for every ledger table.
    pub name: String,

    /// Cached current stock. Authoritative only right after a replay.
    pub stock_quantity: i64,

    /// Inactive products are skipped by the bulk recalculation.
    pub active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Ledger Records
// =============================================================================

/// A stock purchase. Adds to inventory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseRecord {
    pub purchase_id: String,
    pub product_name: String,
    pub purchase_qty: i64,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Balance right after this purchase, written by the replayer.
    pub stock_after_purchase: Option<i64>,
}

/// A client sale. Removes from inventory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleRecord {
    pub sale_id: String,
    pub product_name: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Balance right after this sale. Mirrors `remaining_stock`.
    pub current_stock: Option<i64>,
    /// Balance right after this sale.
    pub remaining_stock: Option<i64>,
    /// Row id of the order that produced this sale, if any.
    pub order_ref: Option<String>,
}

/// Products used by the salon itself. Removes from inventory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ConsumptionRecord {
    pub id: String,
    pub product_name: String,
    pub consumption_qty: i64,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Balance right after this consumption.
    pub stock_after_consumption: Option<i64>,
    pub order_ref: Option<String>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle state of a POS order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Completed
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    /// Unified Payments Interface transfer.
    Upi,
}

// =============================================================================
// Order Item Type
// =============================================================================

/// Whether a line item moves stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// A retail product. Writes a ledger row.
    Product,
    /// A salon service (haircut, facial). No stock effect.
    Service,
}

// =============================================================================
// Order
// =============================================================================

/// A POS order as stored.
///
/// `order_id` and `invoice_number` always carry the same human-readable
/// identifier; both columns exist because different screens read different
/// ones.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub order_id: Option<String>,
    pub invoice_number: Option<String>,
    pub client_name: String,
    pub client_phone: Option<String>,
    /// Explicit category. `None` only on rows older than the column.
    pub order_category: Option<OrderCategory>,
    pub is_salon_consumption: bool,
    pub order_type: Option<String>,
    pub consumption_purpose: Option<String>,
    pub total_cents: i64,
    pub payment_method: Option<PaymentMethod>,
    pub status: OrderStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Effective category: the stored one, else the legacy heuristic.
    pub fn category(&self) -> OrderCategory {
        self.order_category
            .unwrap_or_else(|| classify_legacy(&self.legacy_flags()))
    }

    /// The heuristic fields of this order.
    pub fn legacy_flags(&self) -> LegacyOrderFlags<'_> {
        LegacyOrderFlags {
            is_salon_consumption: self.is_salon_consumption,
            order_type: self.order_type.as_deref(),
            consumption_purpose: self.consumption_purpose.as_deref(),
            client_name: &self.client_name,
        }
    }

    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// The view of this order a renumbering plan works on.
    pub fn sequenced(&self) -> SequencedOrder {
        SequencedOrder {
            id: self.id.clone(),
            category: self.category(),
            created_at: self.created_at,
        }
    }

    /// Returns true if both identifier columns hold `number`.
    pub fn has_number(&self, number: &str) -> bool {
        self.order_id.as_deref() == Some(number) && self.invoice_number.as_deref() == Some(number)
    }

    /// Phone number, if one is present and not blank.
    pub fn phone(&self) -> Option<&str> {
        self.client_phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// A line item on an order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub pos_order_id: String,
    pub item_name: String,
    pub item_type: ItemType,
    /// Product master name, present on product items.
    pub product_name: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents) * self.quantity
    }
}

/// An order together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderDetail {
    /// Distinct product names touched by this order.
    pub fn product_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .items
            .iter()
            .filter_map(|i| i.product_name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

// =============================================================================
// Order Requests
// =============================================================================

/// Input for creating an order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrder {
    pub client_name: String,
    pub client_phone: Option<String>,
    pub category: OrderCategory,
    pub consumption_purpose: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
    /// Order time; defaults to now. Also the ledger date of its rows.
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for one line item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrderItem {
    pub item_name: String,
    pub item_type: ItemType,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl NewOrderItem {
    /// A product line. The product name doubles as the item name.
    pub fn product(name: impl Into<String>, quantity: i64, unit_price_cents: i64) -> Self {
        let name = name.into();
        NewOrderItem {
            item_name: name.clone(),
            item_type: ItemType::Product,
            product_name: Some(name),
            quantity,
            unit_price_cents,
        }
    }

    /// A service line.
    pub fn service(name: impl Into<String>, unit_price_cents: i64) -> Self {
        NewOrderItem {
            item_name: name.into(),
            item_type: ItemType::Service,
            product_name: None,
            quantity: 1,
            unit_price_cents,
        }
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents) * self.quantity
    }
}

/// Partial update of an existing order. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub client_phone: Option<String>,
    pub notes: Option<String>,
}

impl OrderUpdate {
    /// Returns true if nothing would change.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.payment_method.is_none()
            && self.client_phone.is_none()
            && self.notes.is_none()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
