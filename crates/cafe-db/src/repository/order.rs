//! # Order Repository
//!
//! Database operations for orders and order items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE (checkout transaction only, see fulfillment)               │
//! │     └── insert_order() → header row                                    │
//! │     └── insert_item()  → one row per cart line                         │
//! │                                                                         │
//! │  2. READ                                                               │
//! │     └── get_details() → header + items (receipts, order screen)        │
//! │     └── list()        → history with date filters                      │
//! │                                                                         │
//! │  3. MAINTENANCE (admin only)                                           │
//! │     └── reset_counter()        → wipe orders, restart at ORD-000001    │
//! │     └── clean_legacy_orders()  → drop non-canonical order numbers      │
//! │                                                                         │
//! │  Orders are never edited after creation.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use cafe_core::{money, CartLine, Order, OrderDetails, OrderFilter, OrderItem, PaymentMethod};

const ORDER_SELECT: &str = r#"
    SELECT
        o.id,
        o.order_no,
        DATE(o.date) AS date,
        o.total,
        o.discount,
        o.tax,
        o.paid,
        o.payment_method,
        o.user_id,
        u.username AS user_name
    FROM orders o
    LEFT JOIN users u ON u.id = o.user_id
"#;

/// SQL predicate matching canonical `ORD-NNNNNN` numbers.
pub(crate) const CANONICAL_ORDER_NO: &str = r#"
    (order_no LIKE 'ORD-%'
     AND LENGTH(order_no) >= 10
     AND SUBSTR(order_no, 5) NOT GLOB '*[^0-9]*')
"#;

/// Header fields of an order about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_no: String,
    pub date: NaiveDate,
    pub total: f64,
    pub discount: f64,
    pub tax: f64,
    pub paid: f64,
    pub payment_method: PaymentMethod,
    pub user_id: i64,
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order header by ID, with the cashier's username.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let sql = format!("{ORDER_SELECT} WHERE o.id = ?1");

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets the lines of an order in insertion order, with product names.
    pub async fn get_items(&self, order_id: i64) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT
                oi.id,
                oi.order_id,
                oi.product_id,
                oi.qty,
                oi.unit_price,
                oi.subtotal,
                p.name AS product_name
            FROM order_items oi
            LEFT JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = ?1
            ORDER BY oi.id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets an order with its lines.
    pub async fn get_details(&self, id: i64) -> DbResult<Option<OrderDetails>> {
        let Some(order) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.get_items(id).await?;

        Ok(Some(OrderDetails { order, items }))
    }

    /// Lists orders, newest first.
    ///
    /// `from` / `to` are inclusive calendar days; no `limit` means all.
    pub async fn list(&self, filter: &OrderFilter) -> DbResult<Vec<Order>> {
        debug!(from = ?filter.from, to = ?filter.to, limit = ?filter.limit, "Listing orders");

        let sql = format!(
            r#"
            {ORDER_SELECT}
            WHERE (?1 IS NULL OR DATE(o.date) >= ?1)
              AND (?2 IS NULL OR DATE(o.date) <= ?2)
            ORDER BY DATE(o.date) DESC, o.id DESC
            LIMIT ?3
            "#
        );

        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.limit.filter(|l| *l > 0).unwrap_or(-1))
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Counts all orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Deletes every order and restarts numbering at `ORD-000001`.
    ///
    /// Stock is not restored. Returns the number of orders removed.
    pub async fn reset_counter(&self) -> DbResult<u64> {
        warn!("Resetting all orders and the order counter");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM order_items")
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM orders")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("UPDATE order_sequence SET value = 0 WHERE name = 'orders'")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sqlite_sequence WHERE name IN ('orders', 'order_items')")
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(removed, "Order counter reset");
        Ok(removed)
    }

    /// Deletes orders whose numbers aren't canonical `ORD-NNNNNN`.
    ///
    /// Returns the number of orders removed.
    pub async fn clean_legacy_orders(&self) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "DELETE FROM order_items WHERE order_id IN (SELECT id FROM orders WHERE NOT {CANONICAL_ORDER_NO})"
        ))
        .execute(&mut *tx)
        .await?;
        let removed = sqlx::query(&format!("DELETE FROM orders WHERE NOT {CANONICAL_ORDER_NO}"))
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(removed, "Legacy orders removed");
        Ok(removed)
    }

    // =========================================================================
    // Checkout primitives (run on the checkout transaction)
    // =========================================================================

    /// Inserts an order header on `conn` and returns its id.
    pub async fn insert_order(conn: &mut SqliteConnection, order: &NewOrder) -> DbResult<i64> {
        debug!(order_no = %order.order_no, "Inserting order header");

        let result = sqlx::query(
            r#"
            INSERT INTO orders (order_no, date, total, discount, tax, paid, payment_method, user_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&order.order_no)
        .bind(order.date)
        .bind(order.total)
        .bind(order.discount)
        .bind(order.tax)
        .bind(order.paid)
        .bind(order.payment_method)
        .bind(order.user_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Inserts one order line on `conn`; `subtotal = qty * unit_price`.
    pub async fn insert_item(
        conn: &mut SqliteConnection,
        order_id: i64,
        line: &CartLine,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, qty, unit_price, subtotal)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(line.qty)
        .bind(line.unit_price)
        .bind(money::line_subtotal(line.qty, line.unit_price))
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn db_with_user() -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = db
            .users()
            .ensure_default_admin("admin123")
            .await
            .unwrap()
            .unwrap();
        (db, admin.id)
    }

    async fn insert_raw(db: &Database, order_no: &str, date: &str, user_id: i64) -> i64 {
        sqlx::query(
            "INSERT INTO orders (order_no, date, total, discount, tax, paid, payment_method, user_id)
             VALUES (?1, ?2, 10, 0, 0, 10, 'cash', ?3)",
        )
        .bind(order_no)
        .bind(date)
        .bind(user_id)
        .execute(db.pool())
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_get_by_id_joins_cashier() {
        let (db, admin) = db_with_user().await;
        let id = insert_raw(&db, "ORD-000001", "2024-03-01", admin).await;

        let order = db.orders().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(order.order_no, "ORD-000001");
        assert_eq!(order.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(order.user_name.as_deref(), Some("admin"));
        assert_eq!(order.payment_method, PaymentMethod::Cash);

        assert!(db.orders().get_by_id(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_legacy_datetime_dates_are_read_as_days() {
        let (db, admin) = db_with_user().await;
        let id = insert_raw(&db, "ORD-000001", "2024-03-01 18:45:00", admin).await;

        let order = db.orders().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(order.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[tokio::test]
    async fn test_list_date_filter_and_limit() {
        let (db, admin) = db_with_user().await;
        insert_raw(&db, "ORD-000001", "2024-03-01", admin).await;
        insert_raw(&db, "ORD-000002", "2024-03-02", admin).await;
        insert_raw(&db, "ORD-000003", "2024-03-03", admin).await;

        let all = db.orders().list(&OrderFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].order_no, "ORD-000003");

        let ranged = db
            .orders()
            .list(&OrderFilter {
                from: NaiveDate::from_ymd_opt(2024, 3, 2),
                to: NaiveDate::from_ymd_opt(2024, 3, 2),
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].order_no, "ORD-000002");

        let limited = db
            .orders()
            .list(&OrderFilter {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_clean_legacy_orders() {
        let (db, admin) = db_with_user().await;
        insert_raw(&db, "ORD-000001", "2024-03-01", admin).await;
        insert_raw(&db, "ORD-1709300000000-42", "2024-03-01", admin).await;
        insert_raw(&db, "legacy-7", "2024-03-01", admin).await;

        let removed = db.orders().clean_legacy_orders().await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(db.orders().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reset_counter() {
        let (db, admin) = db_with_user().await;
        insert_raw(&db, "ORD-000001", "2024-03-01", admin).await;
        sqlx::query("UPDATE order_sequence SET value = 1 WHERE name = 'orders'")
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(db.orders().reset_counter().await.unwrap(), 1);
        assert_eq!(db.orders().count().await.unwrap(), 0);
        let next = db.fulfillment().peek_order_number().await.unwrap();
        assert_eq!(next, "ORD-000001");
    }
}
