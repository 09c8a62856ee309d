//! # Stock Validator
//!
//! Checks a cart against current stock before anything is written.
//!
//! Lines for the same product are summed first, so a cart holding two
//! lines of 2 lattes is checked as 4 lattes. Every shortage is collected;
//! a missing product stops the check immediately.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbError;
use crate::fulfillment::FulfillmentError;
use crate::repository::ProductRepository;
use cafe_core::{CartLine, CoreError, Shortage};

/// Total quantity requested for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockRequest {
    pub product_id: i64,
    pub qty: i64,
}

impl StockRequest {
    /// Sums cart lines per product, keeping first-seen order.
    pub fn aggregate(lines: &[CartLine]) -> Vec<StockRequest> {
        let mut requests: Vec<StockRequest> = Vec::with_capacity(lines.len());
        for line in lines {
            match requests.iter_mut().find(|r| r.product_id == line.product_id) {
                Some(request) => request.qty += line.qty,
                None => requests.push(StockRequest {
                    product_id: line.product_id,
                    qty: line.qty,
                }),
            }
        }
        requests
    }
}

/// Read-only stock check over a caller-supplied connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockValidator;

impl StockValidator {
    /// Returns every shortage in the cart; an empty list means it can be filled.
    ///
    /// ## Errors
    /// * `CoreError::ProductNotFound` - A line names a product that doesn't exist
    /// * `FulfillmentError::Store` - The read failed
    pub async fn shortages(
        &self,
        conn: &mut SqliteConnection,
        lines: &[CartLine],
    ) -> Result<Vec<Shortage>, FulfillmentError> {
        let mut shortages = Vec::new();

        for request in StockRequest::aggregate(lines) {
            let level = ProductRepository::fetch_stock_level(&mut *conn, request.product_id)
                .await?
                .ok_or(CoreError::ProductNotFound(request.product_id))?;

            if request.qty > level.stock {
                debug!(
                    product_id = level.id,
                    available = level.stock,
                    requested = request.qty,
                    "Stock shortage"
                );
                shortages.push(Shortage {
                    product_id: level.id,
                    name: level.name,
                    available: level.stock,
                    requested: request.qty,
                });
            }
        }

        Ok(shortages)
    }

    /// Like [`shortages`](Self::shortages), but any shortage is an error.
    pub async fn ensure_available(
        &self,
        conn: &mut SqliteConnection,
        lines: &[CartLine],
    ) -> Result<(), FulfillmentError> {
        let shortages = self.shortages(conn, lines).await?;
        if shortages.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InsufficientStock { shortages }.into())
        }
    }
}

/// Shortage for a product whose conditional decrement matched no row.
pub(crate) async fn shortage_after_failed_decrement(
    conn: &mut SqliteConnection,
    product_id: i64,
    requested: i64,
) -> Result<Shortage, FulfillmentError> {
    let level = ProductRepository::fetch_stock_level(conn, product_id)
        .await?
        .ok_or_else(|| DbError::not_found("Product", product_id))?;

    Ok(Shortage {
        product_id,
        name: level.name,
        available: level.stock,
        requested,
    })
}
