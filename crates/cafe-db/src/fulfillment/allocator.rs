//! # Order Number Allocator
//!
//! Hands out `ORD-NNNNNN` numbers from the `order_sequence` counter row.
//!
//! The counter is incremented inside the checkout transaction, so a rolled
//! back checkout also gives its number back. Numbers are never derived from
//! the last order's text.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use cafe_core::OrderNumber;

/// Name of the counter row backing order numbers.
pub const ORDER_SEQUENCE: &str = "orders";

/// Allocates order numbers on a caller-supplied connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderNumberAllocator;

impl OrderNumberAllocator {
    /// Increments the counter and returns the new number.
    ///
    /// Must run on the checkout transaction.
    pub async fn allocate(&self, conn: &mut SqliteConnection) -> DbResult<OrderNumber> {
        let value: Option<i64> = sqlx::query_scalar(
            "UPDATE order_sequence SET value = value + 1 WHERE name = ?1 RETURNING value",
        )
        .bind(ORDER_SEQUENCE)
        .fetch_optional(&mut *conn)
        .await?;

        let number = to_order_number(value)?;
        debug!(order_no = %number, "Allocated order number");
        Ok(number)
    }

    /// Returns the number the next checkout will get, without allocating it.
    pub async fn peek(&self, conn: &mut SqliteConnection) -> DbResult<OrderNumber> {
        let value: Option<i64> =
            sqlx::query_scalar("SELECT value FROM order_sequence WHERE name = ?1")
                .bind(ORDER_SEQUENCE)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(to_order_number(value)?.next())
    }
}

fn to_order_number(value: Option<i64>) -> DbResult<OrderNumber> {
    let value = value.ok_or_else(|| {
        DbError::Internal(format!("Sequence '{ORDER_SEQUENCE}' is missing"))
    })?;

    u64::try_from(value)
        .map(OrderNumber::new)
        .map_err(|_| DbError::Internal(format!("Sequence '{ORDER_SEQUENCE}' is negative: {value}")))
}
