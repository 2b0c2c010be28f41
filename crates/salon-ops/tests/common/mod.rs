//! Shared fixtures for the salon-ops integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use salon_core::{Order, OrderCategory, OrderStatus};
use salon_db::{Database, DbConfig};

pub const SHAMPOO: &str = "Shampoo 200ml";
pub const SERUM: &str = "Keratin Serum";

/// Fresh migrated in-memory store.
pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Midday on the given day of June 2025.
pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, d, 12, 0, 0).unwrap()
}

/// Minutes after 09:00 on 1 June 2025.
pub fn minute(m: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap() + Duration::minutes(m)
}

/// An order row with no identifier yet.
pub fn bare_order(category: Option<OrderCategory>, client: &str, created_at: DateTime<Utc>) -> Order {
    Order {
        id: Uuid::new_v4().to_string(),
        order_id: None,
        invoice_number: None,
        client_name: client.to_string(),
        client_phone: None,
        order_category: category,
        is_salon_consumption: false,
        order_type: None,
        consumption_purpose: None,
        total_cents: 0,
        payment_method: None,
        status: OrderStatus::Completed,
        notes: None,
        created_at,
        updated_at: created_at,
    }
}

/// Inserts categorized orders, one per `(category, minute)` pair, and
/// returns their row ids in the same order.
pub async fn seed_orders(db: &Database, layout: &[(OrderCategory, i64)]) -> Vec<String> {
    let mut ids = Vec::new();
    for (category, m) in layout {
        let order = bare_order(Some(*category), "Walk-in", minute(*m));
        db.orders().insert(&order).await.unwrap();
        ids.push(order.id);
    }
    ids
}

/// Stored identifier of an order row.
pub async fn number_of(db: &Database, id: &str) -> String {
    let order = db.orders().get_by_id(id).await.unwrap().unwrap();
    assert_eq!(order.order_id, order.invoice_number);
    order.order_id.unwrap()
}
