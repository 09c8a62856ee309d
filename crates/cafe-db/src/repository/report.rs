//! # Report Repository
//!
//! Read-only sales aggregates for the reports screen.
//!
//! All queries group on `DATE(o.date)` so orders stored with a time of day
//! still land on their calendar day. Money sums are cast to REAL so empty
//! ranges decode as `0.0` instead of an integer `0`.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use cafe_core::{
    CategorySales, DailySummary, PaymentMethodShare, PaymentMethodTotal, ProductsOverview,
    SalesGrouping, SalesOverview, SalesPeriod, SalesTotals, TopProduct,
};

/// Number of products returned when the caller gives no limit.
pub const DEFAULT_TOP_PRODUCTS: i64 = 10;

/// Repository for report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Totals, items sold, payment split and best sellers for one day.
    pub async fn daily_summary(&self, date: NaiveDate) -> DbResult<DailySummary> {
        debug!(%date, "Building daily summary");

        let totals = sqlx::query_as::<_, SalesTotals>(
            r#"
            SELECT
                COUNT(*) AS orders_count,
                CAST(COALESCE(SUM(total), 0.0) AS REAL) AS total_sales,
                CAST(COALESCE(AVG(total), 0.0) AS REAL) AS avg_order_value,
                CAST(COALESCE(SUM(discount), 0.0) AS REAL) AS total_discount,
                CAST(COALESCE(SUM(tax), 0.0) AS REAL) AS total_tax
            FROM orders
            WHERE DATE(date) = ?1
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        let total_items_sold: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(oi.qty), 0)
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE DATE(o.date) = ?1
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        let payment_methods = sqlx::query_as::<_, PaymentMethodTotal>(
            r#"
            SELECT
                payment_method,
                COUNT(*) AS count,
                CAST(COALESCE(SUM(total), 0.0) AS REAL) AS total
            FROM orders
            WHERE DATE(date) = ?1
            GROUP BY payment_method
            ORDER BY total DESC
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        let top_products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                p.id AS product_id,
                p.name,
                p.sku,
                p.category,
                COALESCE(SUM(oi.qty), 0) AS quantity_sold,
                CAST(COALESCE(SUM(oi.subtotal), 0.0) AS REAL) AS total_revenue,
                COUNT(DISTINCT o.id) AS orders_count
            FROM products p
            JOIN order_items oi ON oi.product_id = p.id
            JOIN orders o ON o.id = oi.order_id
            WHERE p.is_active = 1 AND DATE(o.date) = ?1
            GROUP BY p.id, p.name, p.sku, p.category
            ORDER BY quantity_sold DESC, p.name
            LIMIT ?2
            "#,
        )
        .bind(date)
        .bind(DEFAULT_TOP_PRODUCTS)
        .fetch_all(&self.pool)
        .await?;

        Ok(DailySummary {
            date,
            totals,
            total_items_sold,
            payment_methods,
            top_products,
        })
    }

    /// Best-selling active products of all time.
    ///
    /// Products that never sold are included with zero counts, after the
    /// ones that did.
    pub async fn top_products(&self, limit: Option<i64>) -> DbResult<Vec<TopProduct>> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_TOP_PRODUCTS);
        debug!(limit, "Fetching top products");

        let products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                p.id AS product_id,
                p.name,
                p.sku,
                p.category,
                COALESCE(SUM(oi.qty), 0) AS quantity_sold,
                CAST(COALESCE(SUM(oi.subtotal), 0.0) AS REAL) AS total_revenue,
                COUNT(DISTINCT oi.order_id) AS orders_count
            FROM products p
            LEFT JOIN order_items oi ON oi.product_id = p.id
            WHERE p.is_active = 1
            GROUP BY p.id, p.name, p.sku, p.category
            ORDER BY quantity_sold DESC, p.name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Sales between two days (inclusive), one row per period, newest first.
    pub async fn sales(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        grouping: SalesGrouping,
    ) -> DbResult<Vec<SalesPeriod>> {
        debug!(%from, %to, ?grouping, "Fetching sales report");

        let periods = sqlx::query_as::<_, SalesPeriod>(
            r#"
            SELECT
                strftime(?3, date) AS period,
                COUNT(*) AS orders_count,
                CAST(COALESCE(SUM(total), 0.0) AS REAL) AS total_sales,
                CAST(COALESCE(SUM(discount), 0.0) AS REAL) AS total_discount,
                CAST(COALESCE(SUM(tax), 0.0) AS REAL) AS total_tax,
                CAST(COALESCE(AVG(total), 0.0) AS REAL) AS avg_order_value
            FROM orders
            WHERE DATE(date) BETWEEN ?1 AND ?2
            GROUP BY period
            ORDER BY period DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(grouping.strftime_pattern())
        .fetch_all(&self.pool)
        .await?;

        Ok(periods)
    }

    /// Dashboard figures between two days (inclusive).
    ///
    /// Product and category counts cover active products only; their sales
    /// come from orders inside the range. Categories are ordered by revenue.
    pub async fn overview(&self, from: NaiveDate, to: NaiveDate) -> DbResult<SalesOverview> {
        debug!(%from, %to, "Building sales overview");

        let totals = sqlx::query_as::<_, SalesTotals>(
            r#"
            SELECT
                COUNT(*) AS orders_count,
                CAST(COALESCE(SUM(total), 0.0) AS REAL) AS total_sales,
                CAST(COALESCE(AVG(total), 0.0) AS REAL) AS avg_order_value,
                CAST(COALESCE(SUM(discount), 0.0) AS REAL) AS total_discount,
                CAST(COALESCE(SUM(tax), 0.0) AS REAL) AS total_tax
            FROM orders
            WHERE DATE(date) BETWEEN ?1 AND ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let products = sqlx::query_as::<_, ProductsOverview>(&format!(
            r#"
            SELECT
                COUNT(DISTINCT p.id) AS total_products,
                COUNT(DISTINCT p.category) AS total_categories,
                COALESCE(SUM(s.qty), 0) AS total_items_sold,
                CAST(COALESCE(SUM(s.subtotal), 0.0) AS REAL) AS total_revenue
            FROM products p
            LEFT JOIN ({RANGE_ITEMS}) s ON s.product_id = p.id
            WHERE p.is_active = 1
            "#
        ))
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let payment_methods = sqlx::query_as::<_, PaymentMethodShare>(
            r#"
            SELECT
                payment_method,
                COUNT(*) AS count,
                CAST(COALESCE(SUM(total), 0.0) AS REAL) AS total,
                ROUND(
                    COUNT(*) * 100.0 / (
                        SELECT COUNT(*) FROM orders WHERE DATE(date) BETWEEN ?1 AND ?2
                    ),
                    2
                ) AS percentage
            FROM orders
            WHERE DATE(date) BETWEEN ?1 AND ?2
            GROUP BY payment_method
            ORDER BY total DESC, count DESC, payment_method
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let categories = sqlx::query_as::<_, CategorySales>(&format!(
            r#"
            SELECT
                p.category,
                COUNT(DISTINCT p.id) AS products_count,
                COALESCE(SUM(s.qty), 0) AS items_sold,
                CAST(COALESCE(SUM(s.subtotal), 0.0) AS REAL) AS revenue
            FROM products p
            LEFT JOIN ({RANGE_ITEMS}) s ON s.product_id = p.id
            WHERE p.is_active = 1
            GROUP BY p.category
            ORDER BY revenue DESC, p.category
            "#
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(SalesOverview {
            from,
            to,
            totals,
            products,
            payment_methods,
            categories,
        })
    }
}

/// Order lines of orders placed between `?1` and `?2`.
const RANGE_ITEMS: &str = "SELECT oi.product_id, oi.qty, oi.subtotal \
     FROM order_items oi JOIN orders o ON o.id = oi.order_id \
     WHERE DATE(o.date) BETWEEN ?1 AND ?2";
