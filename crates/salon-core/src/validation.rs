//! # Validation Module
//!
//! Input checks run before an order or product write touches the database.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderService::create_order(NewOrder)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_new_order()  ← THIS MODULE (no I/O, fails fast)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  next order number → insert order → ledger rows → stock replay          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejected order leaves no trace: no identifier consumed, no ledger row.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{ItemType, NewOrder, NewOrderItem};
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_ITEMS, MAX_UNIT_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

fn max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Example
/// ```rust
/// use salon_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Argan Oil 100ml").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required("product_name", name)?;
    max_len("product_name", name, 200)
}

/// Validates the client name on an order.
pub fn validate_client_name(name: &str) -> ValidationResult<()> {
    required("client_name", name)?;
    max_len("client_name", name, 120)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line-item quantity: 1 to [`MAX_ITEM_QUANTITY`].
///
/// ## Example
/// ```rust
/// use salon_core::validation::validate_quantity;
///
/// assert!(validate_quantity(2).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(1000).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a unit price: 0 to [`MAX_UNIT_PRICE_CENTS`].
/// Zero is allowed (complimentary items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_UNIT_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "unit_price_cents".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_CENTS,
        });
    }
    Ok(())
}

// =============================================================================
// Order Validators
// =============================================================================

/// Validates one line item.
pub fn validate_order_item(item: &NewOrderItem) -> ValidationResult<()> {
    required("item_name", &item.item_name)?;
    validate_quantity(item.quantity)?;
    validate_price_cents(item.unit_price_cents)?;

    if item.item_type == ItemType::Product {
        match item.product_name.as_deref() {
            Some(name) => validate_product_name(name)?,
            None => return Err(ValidationError::required("product_name")),
        }
    }
    Ok(())
}

/// Validates a whole order request.
///
/// ## Rules
/// - client name present
/// - 1 to [`MAX_ORDER_ITEMS`] line items
/// - every item passes [`validate_order_item`]
pub fn validate_new_order(order: &NewOrder) -> CoreResult<()> {
    validate_client_name(&order.client_name)?;

    if order.items.is_empty() {
        return Err(ValidationError::required("items").into());
    }
    if order.items.len() > MAX_ORDER_ITEMS {
        return Err(CoreError::TooManyItems {
            max: MAX_ORDER_ITEMS,
        });
    }

    for item in &order.items {
        validate_order_item(item)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::OrderCategory;

    fn order_with(items: Vec<NewOrderItem>) -> NewOrder {
        NewOrder {
            client_name: "Meera".to_string(),
            client_phone: None,
            category: OrderCategory::Sales,
            consumption_purpose: None,
            payment_method: None,
            notes: None,
            items,
            created_at: None,
        }
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Hair Color Cream").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_quantity(1000),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(MAX_UNIT_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(-1).is_err());
        assert!(validate_price_cents(MAX_UNIT_PRICE_CENTS + 1).is_err());
        assert!(validate_price_cents(i64::MAX).is_err());
    }

    #[test]
    fn test_largest_valid_order_total_fits() {
        let item = NewOrderItem::product("Keratin Kit", MAX_ITEM_QUANTITY, MAX_UNIT_PRICE_CENTS);
        let order = order_with(vec![item; MAX_ORDER_ITEMS]);
        assert!(validate_new_order(&order).is_ok());

        let max_total = (MAX_UNIT_PRICE_CENTS as i128)
            * (MAX_ITEM_QUANTITY as i128)
            * (MAX_ORDER_ITEMS as i128);
        assert!(max_total < i64::MAX as i128);
    }

    #[test]
    fn test_validate_new_order() {
        let ok = order_with(vec![
            NewOrderItem::product("Shampoo", 2, 30_000),
            NewOrderItem::service("Haircut", 50_000),
        ]);
        assert!(validate_new_order(&ok).is_ok());

        assert!(validate_new_order(&order_with(vec![])).is_err());

        let mut nameless = ok.clone();
        nameless.client_name = "  ".to_string();
        assert!(validate_new_order(&nameless).is_err());

        let too_many = order_with(
            (0..=MAX_ORDER_ITEMS)
                .map(|_| NewOrderItem::service("Threading", 5_000))
                .collect(),
        );
        assert!(matches!(
            validate_new_order(&too_many),
            Err(CoreError::TooManyItems { .. })
        ));
    }

    #[test]
    fn test_product_item_needs_product_name() {
        let mut item = NewOrderItem::product("Conditioner", 1, 20_000);
        item.product_name = None;
        assert!(matches!(
            validate_order_item(&item),
            Err(ValidationError::Required { .. })
        ));
    }
}
