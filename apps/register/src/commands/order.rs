//! # Order Commands
//!
//! Checkout, receipts, order history and the order counter.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    orders:create                                        │
//! │                                                                         │
//! │  raw JSON order (numbers or numeric strings)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  parse_cart: EMPTY_CART, INVALID_AMOUNT, VALIDATION_ERROR              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OrderFulfillment::create_order (cafe-db)                              │
//! │    totals + payment → lock → tx → stock → number → rows → commit       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  {orderId, orderNo, change}                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{DbState, RegisterConfig};
use cafe_core::validation::{coerce_amount, coerce_optional_amount, coerce_quantity, validate_id};
use cafe_core::{
    Cart, CartLine, CoreError, FulfilledOrder, Order, OrderDetails, OrderFilter, PaymentMethod,
    Receipt, ReceiptSettings, ValidationError,
};

/// `orders:print` result: the receipt data and its plain-text rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintedReceipt {
    pub receipt: Receipt,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NextOrderNumber {
    pub order_no: String,
}

/// Result of the administrative order cleanups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResult {
    pub removed: u64,
    pub message: String,
}

/// Creates an order from the register's cart.
pub async fn create(db: &DbState, raw: Option<&Value>) -> Result<FulfilledOrder, ApiError> {
    let cart = parse_cart(raw)?;
    debug!(lines = cart.items.len(), user_id = cart.user_id, "orders:create");

    let result = db.inner().fulfillment().create_order(&cart).await?;
    Ok(result)
}

/// Builds the receipt for a stored order.
pub async fn print(
    db: &DbState,
    config: &RegisterConfig,
    order_id: i64,
) -> Result<PrintedReceipt, ApiError> {
    validate_id("orderId", order_id)?;

    let details = db
        .inner()
        .orders()
        .get_details(order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", order_id))?;
    let settings = ReceiptSettings::from_map(&db.inner().settings().get_all().await?);

    let receipt = Receipt::build(&details.order, &details.items, &settings);
    let text = receipt.render_text(config.receipt.width);

    info!(order_id, order_no = %receipt.order_no, "Receipt built");
    Ok(PrintedReceipt { receipt, text })
}

pub async fn list(db: &DbState, filter: OrderFilter) -> Result<Vec<Order>, ApiError> {
    if let Some(limit) = filter.limit {
        if limit <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "limit".to_string(),
            }
            .into());
        }
    }
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(ApiError::validation("from must not be after to"));
        }
    }

    Ok(db.inner().orders().list(&filter).await?)
}

pub async fn get_by_id(db: &DbState, id: i64) -> Result<OrderDetails, ApiError> {
    validate_id("id", id)?;

    db.inner()
        .orders()
        .get_details(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", id))
}

/// The number the next order will get. Nothing is allocated.
pub async fn generate_order_number(db: &DbState) -> Result<NextOrderNumber, ApiError> {
    let order_no = db.inner().fulfillment().peek_order_number().await?;
    Ok(NextOrderNumber { order_no })
}

/// Deletes all orders and restarts numbering at `ORD-000001`.
pub async fn reset_counter(db: &DbState) -> Result<CleanupResult, ApiError> {
    let removed = db.inner().orders().reset_counter().await?;
    Ok(CleanupResult {
        removed,
        message: "Order counter reset".to_string(),
    })
}

/// Removes orders whose numbers are not `ORD-NNNNNN`.
pub async fn clean_old_orders(db: &DbState) -> Result<CleanupResult, ApiError> {
    let removed = db.inner().orders().clean_legacy_orders().await?;
    Ok(CleanupResult {
        removed,
        message: format!("Removed {} old orders", removed),
    })
}

// =============================================================================
// Request Parsing
// =============================================================================

/// Turns the raw `orders:create` payload into a [`Cart`].
///
/// Amounts may be numbers or numeric strings. `discount` and `tax` default
/// to zero. An order without lines is `EMPTY_CART` before anything else is
/// looked at.
pub fn parse_cart(raw: Option<&Value>) -> Result<Cart, ApiError> {
    let order = match raw {
        Some(Value::Object(order)) => order,
        Some(Value::Null) | None => return Err(ApiError::validation("order is required")),
        Some(_) => return Err(ApiError::validation("order must be an object")),
    };

    let items = match order.get("items") {
        None | Some(Value::Null) => return Err(CoreError::EmptyCart.into()),
        Some(Value::Array(items)) if items.is_empty() => return Err(CoreError::EmptyCart.into()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ApiError::validation("items must be a list")),
    };

    let total = coerce_amount("total", field(order, "total"))?;
    let discount = coerce_optional_amount("discount", order.get("discount"))?;
    let tax = coerce_optional_amount("tax", order.get("tax"))?;
    let paid = coerce_amount("paid", field(order, "paid"))?;

    let payment_method: PaymentMethod = match order.get("payment_method") {
        Some(Value::String(s)) => s.parse()?,
        _ => {
            return Err(ValidationError::Required {
                field: "payment_method".to_string(),
            }
            .into())
        }
    };

    let user_id = coerce_id("user_id", field(order, "user_id"))?;

    let items = items
        .iter()
        .map(parse_line)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Cart {
        items,
        total,
        discount,
        tax,
        paid,
        payment_method,
        user_id,
    })
}

fn parse_line(item: &Value) -> Result<CartLine, ApiError> {
    let item = item
        .as_object()
        .ok_or_else(|| ApiError::validation("each item must be an object"))?;

    Ok(CartLine {
        product_id: coerce_id("product_id", field(item, "product_id"))?,
        qty: coerce_quantity(field(item, "qty"))?,
        unit_price: coerce_amount("unit_price", field(item, "unit_price"))?,
    })
}

static MISSING: Value = Value::Null;

fn field<'a>(object: &'a Map<String, Value>, key: &str) -> &'a Value {
    object.get(key).unwrap_or(&MISSING)
}

fn coerce_id(name: &str, value: &Value) -> Result<i64, ValidationError> {
    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Null => {
            return Err(ValidationError::Required {
                field: name.to_string(),
            })
        }
        _ => None,
    }
    .ok_or_else(|| ValidationError::InvalidFormat {
        field: name.to_string(),
        reason: "must be a whole number".to_string(),
    })?;

    validate_id(name, id)?;
    Ok(id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use cafe_db::{Database, DbConfig};
    use serde_json::json;

    #[test]
    fn test_parse_cart_coerces_strings() {
        let raw = json!({
            "items": [{"product_id": "3", "qty": "2", "unit_price": "12.50"}],
            "total": "25",
            "paid": 30,
            "payment_method": "wallet",
            "user_id": 1
        });

        let cart = parse_cart(Some(&raw)).unwrap();
        assert_eq!(cart.items[0].product_id, 3);
        assert_eq!(cart.items[0].qty, 2);
        assert_eq!(cart.items[0].unit_price, 12.5);
        assert_eq!(cart.total, 25.0);
        assert_eq!(cart.discount, 0.0);
        assert_eq!(cart.tax, 0.0);
        assert_eq!(cart.payment_method, PaymentMethod::Wallet);
    }

    #[test]
    fn test_parse_cart_empty_first() {
        let raw = json!({"items": [], "total": "abc"});
        let err = parse_cart(Some(&raw)).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyCart);

        let raw = json!({"total": 5});
        assert_eq!(parse_cart(Some(&raw)).unwrap_err().code, ErrorCode::EmptyCart);
    }

    #[test]
    fn test_parse_cart_rejects_bad_amounts() {
        let line = json!([{"product_id": 1, "qty": 1, "unit_price": 5}]);

        for total in [json!(null), json!("abc"), json!(-1)] {
            let raw = json!({"items": line, "total": total, "paid": 5, "payment_method": "cash", "user_id": 1});
            let err = parse_cart(Some(&raw)).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidAmount, "total {total}");
        }

        let raw = json!({"items": line, "total": 5, "discount": -2, "paid": 5, "payment_method": "cash", "user_id": 1});
        assert_eq!(parse_cart(Some(&raw)).unwrap_err().code, ErrorCode::InvalidAmount);
    }

    #[test]
    fn test_parse_cart_rejects_bad_fields() {
        let base = |patch: Value| {
            let mut raw = json!({
                "items": [{"product_id": 1, "qty": 1, "unit_price": 5}],
                "total": 5,
                "paid": 5,
                "payment_method": "cash",
                "user_id": 1
            });
            if let (Value::Object(raw), Value::Object(patch)) = (&mut raw, patch) {
                raw.extend(patch);
            }
            raw
        };

        let err = parse_cart(Some(&base(json!({"payment_method": "bitcoin"})))).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = parse_cart(Some(&base(json!({"items": [{"product_id": 1, "qty": 0, "unit_price": 5}]}))))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = parse_cart(Some(&base(json!({"items": [{"product_id": 1, "qty": 1.5, "unit_price": 5}]}))))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = parse_cart(Some(&base(json!({"user_id": null})))).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert!(parse_cart(Some(&base(json!({})))).is_ok());
        assert_eq!(parse_cart(None).unwrap_err().code, ErrorCode::ValidationError);
    }

    async fn store_with_order() -> (DbState, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.settings().seed_defaults().await.unwrap();
        db.users().ensure_default_admin("admin123").await.unwrap();
        let state = DbState::new(db);

        let id = add_latte(&state).await;
        let raw = json!({
            "items": [{"product_id": id, "qty": 2, "unit_price": 42}],
            "total": 84,
            "paid": 100,
            "payment_method": "cash",
            "user_id": 1
        });
        let result = create(&state, Some(&raw)).await.unwrap();
        (state, result.order_id)
    }

    async fn add_latte(state: &DbState) -> i64 {
        state
            .inner()
            .products()
            .insert(&cafe_core::NewProduct {
                name: "Latte".to_string(),
                price: 42.0,
                category: "Hot Drinks".to_string(),
                sku: "HOT-005".to_string(),
                stock: 10,
                image: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_print_receipt() {
        let (state, order_id) = store_with_order().await;

        let printed = print(&state, &RegisterConfig::default(), order_id).await.unwrap();
        assert_eq!(printed.receipt.order_no, "ORD-000001");
        assert_eq!(printed.receipt.subtotal, 84.0);
        assert_eq!(printed.receipt.change, 16.0);
        assert_eq!(printed.receipt.cafe_name, "Corner Cafe");
        assert!(printed.text.contains("ORD-000001"));
        assert!(printed.text.contains("Latte"));

        let err = print(&state, &RegisterConfig::default(), 999).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_history_and_counter() {
        let (state, order_id) = store_with_order().await;

        let details = get_by_id(&state, order_id).await.unwrap();
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.order.user_name.as_deref(), Some("admin"));

        let orders = list(&state, OrderFilter::default()).await.unwrap();
        assert_eq!(orders.len(), 1);

        let err = list(
            &state,
            OrderFilter {
                limit: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert_eq!(
            generate_order_number(&state).await.unwrap().order_no,
            "ORD-000002"
        );

        let reset = reset_counter(&state).await.unwrap();
        assert_eq!(reset.removed, 1);
        assert_eq!(
            generate_order_number(&state).await.unwrap().order_no,
            "ORD-000001"
        );

        assert_eq!(clean_old_orders(&state).await.unwrap().removed, 0);
    }
}
