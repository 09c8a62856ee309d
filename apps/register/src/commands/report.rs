//! # Report Commands
//!
//! Read-only sales figures for the back office screen.

use chrono::{Days, Local, NaiveDate};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::DbState;
use cafe_core::{
    DailySummary, SalesGrouping, SalesOverview, SalesPeriod, TopProduct, ValidationError,
};

/// Days covered by `reports:overview` when no start date is given.
pub const OVERVIEW_DEFAULT_DAYS: u64 = 30;

/// `reports:sales` query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default, alias = "group_by")]
    pub group_by: SalesGrouping,
}

/// `reports:overview` range. Missing ends default to the last
/// [`OVERVIEW_DEFAULT_DAYS`] days up to today.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverviewQuery {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

/// Summary of one day; today when no date is given.
pub async fn daily_summary(
    db: &DbState,
    date: Option<NaiveDate>,
) -> Result<DailySummary, ApiError> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    Ok(db.inner().reports().daily_summary(date).await?)
}

pub async fn top_products(db: &DbState, limit: Option<i64>) -> Result<Vec<TopProduct>, ApiError> {
    if matches!(limit, Some(n) if n <= 0) {
        return Err(ValidationError::MustBePositive {
            field: "limit".to_string(),
        }
        .into());
    }

    Ok(db.inner().reports().top_products(limit).await?)
}

pub async fn sales(db: &DbState, query: SalesQuery) -> Result<Vec<SalesPeriod>, ApiError> {
    if query.from > query.to {
        return Err(ApiError::validation("from must not be after to"));
    }

    Ok(db
        .inner()
        .reports()
        .sales(query.from, query.to, query.group_by)
        .await?)
}

pub async fn overview(db: &DbState, query: OverviewQuery) -> Result<SalesOverview, ApiError> {
    let to = query.to.unwrap_or_else(|| Local::now().date_naive());
    let from = match query.from {
        Some(from) => from,
        None => to
            .checked_sub_days(Days::new(OVERVIEW_DEFAULT_DAYS))
            .unwrap_or(NaiveDate::MIN),
    };
    if from > to {
        return Err(ApiError::validation("from must not be after to"));
    }

    Ok(db.inner().reports().overview(from, to).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::order;
    use crate::error::ErrorCode;
    use cafe_core::NewProduct;
    use cafe_db::{Database, DbConfig};
    use serde_json::json;

    async fn store_with_sale() -> DbState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().ensure_default_admin("admin123").await.unwrap();
        let state = DbState::new(db);

        let mocha = state
            .inner()
            .products()
            .insert(&NewProduct {
                name: "Mocha".to_string(),
                price: 48.0,
                category: "Hot Drinks".to_string(),
                sku: "HOT-007".to_string(),
                stock: 10,
                image: None,
            })
            .await
            .unwrap();

        let raw = json!({
            "items": [{"product_id": mocha.id, "qty": 2, "unit_price": 48}],
            "total": 96,
            "paid": 100,
            "payment_method": "card",
            "user_id": 1
        });
        order::create(&state, Some(&raw)).await.unwrap();
        state
    }

    #[tokio::test]
    async fn test_today_summary() {
        let db = store_with_sale().await;

        let summary = daily_summary(&db, None).await.unwrap();
        assert_eq!(summary.date, Local::now().date_naive());
        assert_eq!(summary.totals.orders_count, 1);
        assert_eq!(summary.totals.total_sales, 96.0);
        assert_eq!(summary.total_items_sold, 2);
        assert_eq!(summary.top_products[0].name, "Mocha");
    }

    #[tokio::test]
    async fn test_top_products_limit() {
        let db = store_with_sale().await;

        let top = top_products(&db, None).await.unwrap();
        assert_eq!(top[0].quantity_sold, 2);

        let err = top_products(&db, Some(0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_overview_defaults_to_last_thirty_days() {
        let db = store_with_sale().await;
        let today = Local::now().date_naive();

        let report = overview(&db, OverviewQuery::default()).await.unwrap();
        assert_eq!(report.to, today);
        assert_eq!(report.from, today - chrono::Duration::days(30));
        assert_eq!(report.totals.orders_count, 1);
        assert_eq!(report.products.total_items_sold, 2);
        assert_eq!(report.payment_methods[0].percentage, 100.0);
        assert_eq!(report.categories[0].category, "Hot Drinks");

        let query: OverviewQuery = serde_json::from_value(json!({
            "from": today.to_string(),
            "to": today.pred_opt().unwrap().to_string()
        }))
        .unwrap();
        let err = overview(&db, query).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_sales_query() {
        let db = store_with_sale().await;
        let today = Local::now().date_naive();

        let query: SalesQuery = serde_json::from_value(json!({
            "from": today.to_string(),
            "to": today.to_string(),
            "groupBy": "month"
        }))
        .unwrap();
        let periods = sales(&db, query).await.unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].period, today.format("%Y-%m").to_string());

        let query = SalesQuery {
            from: today,
            to: today.pred_opt().unwrap(),
            group_by: SalesGrouping::Day,
        };
        assert!(sales(&db, query).await.is_err());
    }
}
