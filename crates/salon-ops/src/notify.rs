//! # Order Notifications
//!
//! The seam between the order lifecycle and a client messaging provider.
//!
//! The order service decides whether to notify (phone present, sales order,
//! automation toggle on) and calls the notifier after the order is durable.
//! Whatever the notifier returns, the order operation has already succeeded;
//! errors are logged at the call site.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use salon_core::Order;

use crate::error::NotifyError;

// =============================================================================
// Notifier Trait
// =============================================================================

/// Sends order messages to clients (implemented by the messaging integration).
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    /// A new order was recorded.
    async fn order_created(&self, order: &Order) -> Result<(), NotifyError>;

    /// An order's status, payment or contact details changed.
    async fn order_updated(&self, order: &Order) -> Result<(), NotifyError>;

    /// An order was removed. `order` is the row as it was before deletion.
    async fn order_deleted(&self, order: &Order, reason: Option<&str>) -> Result<(), NotifyError>;
}

/// No-op notifier for tests and the console.
pub struct NoOpNotifier;

#[async_trait]
impl OrderNotifier for NoOpNotifier {
    async fn order_created(&self, _order: &Order) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn order_updated(&self, _order: &Order) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn order_deleted(&self, _order: &Order, _reason: Option<&str>) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Writes each message to the log instead of sending it.
pub struct LogNotifier;

#[async_trait]
impl OrderNotifier for LogNotifier {
    async fn order_created(&self, order: &Order) -> Result<(), NotifyError> {
        info!(message = %message_payload(order, "created", None), "Order notification");
        Ok(())
    }

    async fn order_updated(&self, order: &Order) -> Result<(), NotifyError> {
        info!(message = %message_payload(order, "updated", None), "Order notification");
        Ok(())
    }

    async fn order_deleted(&self, order: &Order, reason: Option<&str>) -> Result<(), NotifyError> {
        info!(message = %message_payload(order, "deleted", reason), "Order notification");
        Ok(())
    }
}

/// The provider-facing message body for one event.
pub fn message_payload(order: &Order, event: &str, reason: Option<&str>) -> serde_json::Value {
    json!({
        "event": event,
        "phone": order.phone(),
        "client_name": order.client_name,
        "order_id": order.order_id,
        "total": order.total().to_string(),
        "status": order.status,
        "reason": reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use salon_core::{OrderCategory, OrderStatus};

    #[test]
    fn test_payload_carries_order_fields() {
        let now = Utc::now();
        let order = Order {
            id: "o1".to_string(),
            order_id: Some("RNG0007/2526".to_string()),
            invoice_number: Some("RNG0007/2526".to_string()),
            client_name: "Meera".to_string(),
            client_phone: Some(" 9845012345 ".to_string()),
            order_category: Some(OrderCategory::Sales),
            is_salon_consumption: false,
            order_type: None,
            consumption_purpose: None,
            total_cents: 120_000,
            payment_method: None,
            status: OrderStatus::Completed,
            notes: None,
            created_at: now,
            updated_at: now,
        };

        let payload = message_payload(&order, "deleted", Some("duplicate entry"));
        assert_eq!(payload["phone"], "9845012345");
        assert_eq!(payload["order_id"], "RNG0007/2526");
        assert_eq!(payload["total"], "₹1200.00");
        assert_eq!(payload["status"], "completed");
        assert_eq!(payload["reason"], "duplicate entry");
    }
}
