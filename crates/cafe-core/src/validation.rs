//! # Validation Module
//!
//! Input validation utilities for the cafe register.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Register UI (external)                                       │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Register command (Rust)                                      │
//! │  ├── Amount coercion (number or numeric string)                        │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (stock >= 0, qty > 0, amounts >= 0)             │
//! │  ├── UNIQUE constraints (sku, order_no, username)                      │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use cafe_core::validation::{validate_sku, validate_quantity};
//!
//! // Validate SKU before database insert
//! validate_sku("LATT-001").unwrap();
//!
//! // Validate quantity before checkout
//! validate_quantity(5).unwrap();
//! ```

use serde_json::Value;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{approx_eq, is_underpaid};
use crate::types::Cart;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 50 characters
/// - Should contain only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use cafe_core::validation::validate_sku;
///
/// assert!(validate_sku("LATT-001").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a product category label.
pub fn validate_category(category: &str) -> ValidationResult<()> {
    let category = category.trim();

    if category.is_empty() {
        return Err(ValidationError::Required {
            field: "category".to_string(),
        });
    }

    if category.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "category".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all/default results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a username: 3 to 50 characters, no whitespace.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    let len = username.chars().count();
    if len < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    if len > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }

    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(())
}

/// Validates a new password. Minimum 6 characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - No upper bound; stock is the only limit
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Checkout: each cart line                                              │
/// │                                                                         │
/// │  Line requests qty: 5                                                  │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       └── OK → Proceed with stock validation                           │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level. Zero is allowed.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a currency amount: finite and not negative.
///
/// ## Example
/// ```rust
/// use cafe_core::validation::validate_amount;
///
/// assert!(validate_amount("price", 12.5).is_ok());
/// assert!(validate_amount("price", 0.0).is_ok());   // Free item
/// assert!(validate_amount("price", -1.0).is_err());
/// assert!(validate_amount("price", f64::NAN).is_err());
/// ```
pub fn validate_amount(field: &str, value: f64) -> CoreResult<()> {
    if !value.is_finite() {
        return Err(CoreError::invalid_amount(field, "must be a finite number"));
    }

    if value < 0.0 {
        return Err(CoreError::invalid_amount(field, "must not be negative"));
    }

    Ok(())
}

/// Coerces a request value into an amount.
///
/// Accepts JSON numbers and numeric strings (`"12.50"`), since the register
/// UI sends whatever its input fields hold. Everything else is rejected.
///
/// ## Example
/// ```rust
/// use cafe_core::validation::coerce_amount;
/// use serde_json::json;
///
/// assert_eq!(coerce_amount("paid", &json!(20)).unwrap(), 20.0);
/// assert_eq!(coerce_amount("paid", &json!(" 12.5 ")).unwrap(), 12.5);
/// assert!(coerce_amount("paid", &json!("abc")).is_err());
/// assert!(coerce_amount("paid", &json!(null)).is_err());
/// ```
pub fn coerce_amount(field: &str, value: &Value) -> CoreResult<f64> {
    let amount = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| CoreError::invalid_amount(field, "is not a number"))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| CoreError::invalid_amount(field, "is not a number"))?,
        Value::Null => return Err(CoreError::invalid_amount(field, "is required")),
        _ => return Err(CoreError::invalid_amount(field, "is not a number")),
    };

    validate_amount(field, amount)?;
    Ok(amount)
}

/// Like [`coerce_amount`], but a missing or null value means zero.
pub fn coerce_optional_amount(field: &str, value: Option<&Value>) -> CoreResult<f64> {
    match value {
        None | Some(Value::Null) => Ok(0.0),
        Some(v) => coerce_amount(field, v),
    }
}

/// Coerces a request value into a line quantity.
///
/// Integral numbers and integer strings only; `1.5` cups is not a thing.
pub fn coerce_quantity(value: &Value) -> ValidationResult<i64> {
    let invalid = || ValidationError::InvalidFormat {
        field: "quantity".to_string(),
        reason: "must be a whole number".to_string(),
    };

    let qty = match value {
        Value::Number(n) => match n.as_i64() {
            Some(q) => q,
            None => {
                let f = n.as_f64().ok_or_else(invalid)?;
                if f.fract() != 0.0 || !f.is_finite() {
                    return Err(invalid());
                }
                f as i64
            }
        },
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    validate_quantity(qty)?;
    Ok(qty)
}

/// Validates a row id supplied by the caller.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Cart Validation
// =============================================================================

/// Validates a cart before any store access.
///
/// ## Checks (in order)
/// 1. At least one line → [`CoreError::EmptyCart`]
/// 2. Ids and quantities → [`CoreError::Validation`]
/// 3. Every amount finite and non-negative → [`CoreError::InvalidAmount`]
/// 4. `total == subtotal - discount + tax` within tolerance
///    → [`CoreError::TotalMismatch`]
/// 5. `paid >= total`, exactly → [`CoreError::InsufficientPayment`]
///
/// Stock is not checked here; that needs the store.
pub fn validate_cart(cart: &Cart) -> CoreResult<()> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    validate_id("user_id", cart.user_id)?;

    for line in &cart.items {
        validate_id("product_id", line.product_id)?;
        validate_quantity(line.qty)?;
        validate_amount("unit_price", line.unit_price)?;
    }

    validate_amount("total", cart.total)?;
    validate_amount("discount", cart.discount)?;
    validate_amount("tax", cart.tax)?;
    validate_amount("paid", cart.paid)?;

    let expected = cart.expected_total();
    if !approx_eq(cart.total, expected) {
        return Err(CoreError::TotalMismatch {
            expected,
            actual: cart.total,
        });
    }

    if is_underpaid(cart.paid, cart.total) {
        return Err(CoreError::InsufficientPayment {
            paid: cart.paid,
            total: cart.total,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CartLine, PaymentMethod};
    use serde_json::json;

    fn cart(total: f64, paid: f64) -> Cart {
        Cart {
            items: vec![
                CartLine {
                    product_id: 1,
                    qty: 2,
                    unit_price: 10.0,
                },
                CartLine {
                    product_id: 2,
                    qty: 1,
                    unit_price: 5.5,
                },
            ],
            total,
            discount: 1.5,
            tax: 2.0,
            paid,
            payment_method: PaymentMethod::Cash,
            user_id: 1,
        }
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("LATT-001").is_ok());
        assert!(validate_sku("PRD_123").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("HAS SPACE").is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Flat White").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_username_and_password() {
        assert!(validate_username("cashier1").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("two words").is_err());
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("12345").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(1000).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_coerce_amount() {
        assert_eq!(coerce_amount("total", &json!(20.5)).unwrap(), 20.5);
        assert_eq!(coerce_amount("total", &json!("20.50")).unwrap(), 20.5);
        assert!(matches!(
            coerce_amount("total", &json!(-1)),
            Err(CoreError::InvalidAmount { .. })
        ));
        assert!(matches!(
            coerce_amount("total", &json!("twenty")),
            Err(CoreError::InvalidAmount { .. })
        ));
        assert!(matches!(
            coerce_amount("total", &json!("NaN")),
            Err(CoreError::InvalidAmount { .. })
        ));
        assert!(coerce_amount("total", &json!([1])).is_err());
    }

    #[test]
    fn test_coerce_optional_amount_defaults_to_zero() {
        assert_eq!(coerce_optional_amount("tax", None).unwrap(), 0.0);
        assert_eq!(coerce_optional_amount("tax", Some(&json!(null))).unwrap(), 0.0);
        assert_eq!(coerce_optional_amount("tax", Some(&json!("1.5"))).unwrap(), 1.5);
    }

    #[test]
    fn test_coerce_quantity() {
        assert_eq!(coerce_quantity(&json!(3)).unwrap(), 3);
        assert_eq!(coerce_quantity(&json!(3.0)).unwrap(), 3);
        assert_eq!(coerce_quantity(&json!("4")).unwrap(), 4);
        assert_eq!(coerce_quantity(&json!(1500)).unwrap(), 1500);
        assert!(coerce_quantity(&json!(1.5)).is_err());
        assert!(coerce_quantity(&json!(0)).is_err());
        assert!(coerce_quantity(&json!(null)).is_err());
    }

    #[test]
    fn test_validate_cart_accepts_consistent_cart() {
        // 2 x 10.00 + 5.50 - 1.50 + 2.00 = 26.00
        assert!(validate_cart(&cart(26.0, 30.0)).is_ok());
    }

    #[test]
    fn test_validate_cart_rejects_empty() {
        let mut c = cart(26.0, 30.0);
        c.items.clear();
        assert!(matches!(validate_cart(&c), Err(CoreError::EmptyCart)));
    }

    #[test]
    fn test_validate_cart_rejects_total_mismatch() {
        assert!(matches!(
            validate_cart(&cart(25.0, 30.0)),
            Err(CoreError::TotalMismatch { .. })
        ));
        // Within tolerance is fine
        assert!(validate_cart(&cart(26.004, 30.0)).is_ok());
    }

    #[test]
    fn test_validate_cart_rejects_underpayment() {
        assert!(matches!(
            validate_cart(&cart(26.0, 20.0)),
            Err(CoreError::InsufficientPayment { .. })
        ));
        // The amount tolerance never favours the customer
        assert!(matches!(
            validate_cart(&cart(26.0, 25.996)),
            Err(CoreError::InsufficientPayment { .. })
        ));
        assert!(validate_cart(&cart(26.0, 26.0)).is_ok());
    }

    #[test]
    fn test_validate_cart_rejects_bad_lines() {
        let mut c = cart(26.0, 30.0);
        c.items[0].qty = 0;
        assert!(matches!(validate_cart(&c), Err(CoreError::Validation(_))));

        let mut c = cart(26.0, 30.0);
        c.items[1].unit_price = -5.5;
        assert!(matches!(
            validate_cart(&c),
            Err(CoreError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_validate_cart_rejects_negative_discount() {
        let mut c = cart(26.0, 30.0);
        c.discount = -1.0;
        assert!(matches!(
            validate_cart(&c),
            Err(CoreError::InvalidAmount { .. })
        ));
    }
}
