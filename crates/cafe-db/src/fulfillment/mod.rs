//! # Order Fulfillment
//!
//! Turns a validated cart into a persisted order in one transaction.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Checkout (create_order)                            │
//! │                                                                         │
//! │  Cart ──► validate_cart()            EMPTY_CART / INVALID_AMOUNT /     │
//! │              │                       INSUFFICIENT_PAYMENT (no writes)  │
//! │              ▼                                                          │
//! │  checkout lock ──► BEGIN                                               │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  StockValidator ─────────────────── PRODUCT_NOT_FOUND /                │
//! │              │                      INSUFFICIENT_STOCK (all shortages) │
//! │              ▼                                                          │
//! │  OrderNumberAllocator  (order_sequence + 1 → ORD-NNNNNN)               │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  INSERT orders                                                         │
//! │  for each line: INSERT order_items, UPDATE stock WHERE stock >= qty    │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  COMMIT ──► { orderId, orderNo, change }                               │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: nothing is kept.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod allocator;
mod orchestrator;
mod stock;

pub use allocator::{OrderNumberAllocator, ORDER_SEQUENCE};
pub use orchestrator::OrderFulfillment;
pub use stock::{StockRequest, StockValidator};

use thiserror::Error;

use crate::error::DbError;
use cafe_core::CoreError;

/// Why a checkout failed.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The cart broke a business rule (amounts, stock, unknown product).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] DbError),
}

impl From<sqlx::Error> for FulfillmentError {
    fn from(err: sqlx::Error) -> Self {
        FulfillmentError::Store(err.into())
    }
}
