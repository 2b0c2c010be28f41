//! # Seed Data Generator
//!
//! Populates a database with a small salon's worth of stock history and
//! legacy orders for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./salon_dev.db with 60 days of history (default)
//! cargo run -p salon-db --bin seed
//!
//! # Custom history length and database path
//! cargo run -p salon-db --bin seed -- --days 120 --db ./data/salon.db
//! ```
//!
//! ## Generated Data
//! - Retail and backbar products (shampoos, serums, color, wax)
//! - A purchase every week per product
//! - Daily sales and salon consumption
//! - Legacy orders with no category and no number, so
//!   `devtools migrate-order-ids` has something to do
//!
//! Stock snapshots are left empty; run `devtools recalc-stock` afterwards.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::env;
use uuid::Uuid;

use salon_core::{Order, OrderStatus, PaymentMethod, SALON_CONSUMPTION_CLIENT};
use salon_db::{Database, DbConfig};

/// Products with a rough weekly purchase size.
const PRODUCTS: &[(&str, i64)] = &[
    ("Shampoo 200ml", 24),
    ("Conditioner 200ml", 18),
    ("Keratin Serum 50ml", 10),
    ("Hair Color Cream Black", 30),
    ("Hair Color Cream Burgundy", 12),
    ("Argan Oil 100ml", 8),
    ("Styling Wax 75g", 10),
    ("Facial Cleanser 150ml", 12),
    ("Bleach Powder 500g", 6),
    ("Developer 20 Vol 1L", 6),
];

const CLIENTS: &[&str] = &["Anita", "Priya", "Rahul", "Meera", "Kavya", "Arjun"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut days: i64 = 60;
    let mut db_path = String::from("./salon_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(60);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Salon POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Days of history to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./salon_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Salon POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("History:  {} days", days);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = Utc::now() - Duration::days(days);
    let mut ledger_rows = 0usize;

    for (idx, (name, weekly)) in PRODUCTS.iter().enumerate() {
        db.products().insert(name, 0).await?;

        for day in 0..days {
            let date = at(start, day, 9);
            let seed = idx as i64 * 31 + day;

            if day % 7 == 0 {
                db.purchases().insert(name, *weekly, date).await?;
                ledger_rows += 1;
            }
            if seed % 3 == 0 {
                db.sales().insert(name, 1 + seed % 2, at(start, day, 13)).await?;
                ledger_rows += 1;
            }
            if seed % 5 == 0 {
                db.consumption().insert(name, 1, at(start, day, 17)).await?;
                ledger_rows += 1;
            }
        }
    }

    println!("✓ Inserted {} products, {} ledger rows", PRODUCTS.len(), ledger_rows);

    let mut orders = 0usize;
    for day in 0..days {
        let created = at(start, day, 11);
        let client = CLIENTS[(day as usize) % CLIENTS.len()];
        db.orders().insert(&legacy_order(client, created, day)).await?;
        orders += 1;

        if day % 6 == 0 {
            db.orders()
                .insert(&legacy_order(SALON_CONSUMPTION_CLIENT, at(start, day, 18), day))
                .await?;
            orders += 1;
        }
    }

    println!("✓ Inserted {} legacy orders (uncategorized, unnumbered)", orders);
    println!();
    println!("Next: devtools full-system-update");
    println!("✓ Seed complete!");

    Ok(())
}

fn at(start: DateTime<Utc>, day: i64, hour: u32) -> DateTime<Utc> {
    let d = start + Duration::days(day);
    Utc.from_utc_datetime(
        &d.date_naive()
            .and_hms_opt(hour, 0, 0)
            .unwrap_or_else(|| d.naive_utc()),
    )
}

fn legacy_order(client: &str, created_at: DateTime<Utc>, seed: i64) -> Order {
    let payment = match seed % 3 {
        0 => PaymentMethod::Cash,
        1 => PaymentMethod::Card,
        _ => PaymentMethod::Upi,
    };

    Order {
        id: Uuid::new_v4().to_string(),
        order_id: None,
        invoice_number: None,
        client_name: client.to_string(),
        client_phone: None,
        order_category: None,
        is_salon_consumption: false,
        order_type: None,
        consumption_purpose: None,
        total_cents: 50_000 + (seed % 7) * 10_000,
        payment_method: Some(payment),
        status: OrderStatus::Completed,
        notes: None,
        created_at,
        updated_at: created_at,
    }
}
