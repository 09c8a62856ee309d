//! # Order Fulfillment Orchestrator
//!
//! The checkout service handed out by [`Database::fulfillment`](crate::Database::fulfillment).

use std::sync::Arc;

use chrono::Local;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::allocator::OrderNumberAllocator;
use super::stock::{shortage_after_failed_decrement, StockValidator};
use super::FulfillmentError;
use crate::error::{DbError, DbResult};
use crate::repository::{NewOrder, OrderRepository, ProductRepository};
use cafe_core::validation::validate_cart;
use cafe_core::{Cart, CoreError, FulfilledOrder};

/// Creates orders from carts.
///
/// Clones share the checkout lock, so two checkouts in this process never
/// overlap. The conditional stock decrement keeps stock non-negative even
/// against writers outside the process.
#[derive(Debug, Clone)]
pub struct OrderFulfillment {
    pool: SqlitePool,
    checkout_lock: Arc<Mutex<()>>,
    allocator: OrderNumberAllocator,
    validator: StockValidator,
}

impl OrderFulfillment {
    pub fn new(pool: SqlitePool, checkout_lock: Arc<Mutex<()>>) -> Self {
        OrderFulfillment {
            pool,
            checkout_lock,
            allocator: OrderNumberAllocator,
            validator: StockValidator,
        }
    }

    /// Validates, persists and returns a new order.
    ///
    /// Either the header, every line and every stock decrement are committed
    /// together, or nothing is.
    ///
    /// ## Errors
    /// * `CoreError::EmptyCart`, `InvalidAmount`, `TotalMismatch`,
    ///   `InsufficientPayment`, `Validation` - Before any store access
    /// * `CoreError::ProductNotFound` - A line names an unknown product
    /// * `CoreError::InsufficientStock` - Every short product, in cart order
    /// * `FulfillmentError::Store` - The store failed; rolled back
    pub async fn create_order(&self, cart: &Cart) -> Result<FulfilledOrder, FulfillmentError> {
        validate_cart(cart)?;

        let _guard = self.checkout_lock.lock().await;
        debug!(lines = cart.items.len(), total = cart.total, "Checkout started");

        let mut tx = self.pool.begin().await?;

        self.validator.ensure_available(&mut tx, &cart.items).await?;

        let order_no = self.allocator.allocate(&mut tx).await?.to_string();

        let order_id = OrderRepository::insert_order(
            &mut tx,
            &NewOrder {
                order_no: order_no.clone(),
                date: Local::now().date_naive(),
                total: cart.total,
                discount: cart.discount,
                tax: cart.tax,
                paid: cart.paid,
                payment_method: cart.payment_method,
                user_id: cart.user_id,
            },
        )
        .await?;

        for line in &cart.items {
            OrderRepository::insert_item(&mut tx, order_id, line).await?;

            if !ProductRepository::decrement_stock(&mut tx, line.product_id, line.qty).await? {
                let shortage =
                    shortage_after_failed_decrement(&mut tx, line.product_id, line.qty).await?;
                warn!(%order_no, product_id = line.product_id, "Stock changed during checkout");
                return Err(CoreError::InsufficientStock {
                    shortages: vec![shortage],
                }
                .into());
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let change = cart.change();
        info!(
            order_id,
            %order_no,
            total = cart.total,
            payment_method = %cart.payment_method,
            "Order created"
        );

        Ok(FulfilledOrder {
            order_id,
            order_no,
            change,
        })
    }

    /// The order number the next checkout will get. Allocates nothing.
    pub async fn peek_order_number(&self) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        let next = self.allocator.peek(&mut conn).await?;
        Ok(next.to_string())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
