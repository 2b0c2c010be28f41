//! # Repository Module
//!
//! One repository per table family.
//!
//! ## Two Kinds of Method
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  &self methods             run on the pool; one statement each          │
//! │    list_for_product(), get_by_id(), sample(), ...                       │
//! │                                                                         │
//! │  associated fns taking     run on a caller-owned connection, normally   │
//! │  &mut SqliteConnection     a transaction from Database::begin()         │
//! │    set_stock(), set_number(), insert_with(), delete_for_order(), ...    │
//! │                                                                         │
//! │  Services open one transaction per product or per partition and call   │
//! │  the associated fns inside it, so a failed pass leaves nothing behind. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product master
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Stock in
//! - [`SaleRepository`](sale::SaleRepository) - Client sales
//! - [`ConsumptionRepository`](consumption::ConsumptionRepository) - Salon use
//! - [`OrderRepository`](order::OrderRepository) - POS orders and items

pub mod consumption;
pub mod order;
pub mod product;
pub mod purchase;
pub mod sale;
