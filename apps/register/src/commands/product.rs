//! # Product Commands
//!
//! Menu management and lookups for the register grid and the barcode
//! scanner.
//!
//! ## Lookup Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Lookup                                       │
//! │                                                                         │
//! │  Scanner reads "HOT-001"                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  products:getByBarcode ──► active product with exactly that SKU        │
//! │                                                                         │
//! │  Cashier types "lat" in the search box                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  products:list {search: "lat"} ──► name or SKU contains "lat"          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde_json::Value;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::DbState;
use cafe_core::validation::{
    validate_amount, validate_category, validate_id, validate_product_name, validate_search_query,
    validate_sku, validate_stock,
};
use cafe_core::{NewProduct, Product, ProductFilter, ProductUpdate};
use cafe_db::repository::product;

pub async fn list(db: &DbState, mut filter: ProductFilter) -> Result<Vec<Product>, ApiError> {
    if let Some(search) = filter.search.take() {
        let search = validate_search_query(&search)?;
        filter.search = (!search.is_empty()).then_some(search);
    }

    Ok(db.inner().products().list(&filter).await?)
}

pub async fn get_by_id(db: &DbState, id: i64) -> Result<Product, ApiError> {
    validate_id("id", id)?;

    db.inner()
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))
}

/// Active product whose SKU is exactly `sku`.
pub async fn get_by_barcode(db: &DbState, sku: &str) -> Result<Product, ApiError> {
    let sku = sku.trim();
    if sku.is_empty() {
        return Err(ApiError::validation("sku is required"));
    }

    db.inner()
        .products()
        .find_active_by_sku(sku)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", sku))
}

pub async fn create(db: &DbState, product: NewProduct) -> Result<Product, ApiError> {
    validate_product_name(&product.name)?;
    validate_category(&product.category)?;
    validate_sku(&product.sku)?;
    validate_amount("price", product.price)?;
    validate_stock(product.stock)?;

    Ok(db.inner().products().insert(&product).await?)
}

/// Updates a product.
///
/// A payload holding nothing but `is_active` toggles the product; anything
/// else must be a full product.
pub async fn update(db: &DbState, id: i64, payload: Value) -> Result<Product, ApiError> {
    validate_id("id", id)?;

    if let Some(active) = activation_only(&payload) {
        debug!(id, active, "Toggling product");
        db.inner().products().set_active(id, active).await?;
        return get_by_id(db, id).await;
    }

    let update: ProductUpdate = serde_json::from_value(payload)
        .map_err(|e| ApiError::validation(format!("Invalid product: {}", e)))?;

    validate_product_name(&update.name)?;
    validate_category(&update.category)?;
    validate_sku(&update.sku)?;
    validate_amount("price", update.price)?;
    validate_stock(update.stock)?;

    Ok(db.inner().products().update(id, &update).await?)
}

fn activation_only(payload: &Value) -> Option<bool> {
    let object = payload.as_object()?;
    if object.len() != 1 {
        return None;
    }
    match object.get("is_active")? {
        Value::Bool(active) => Some(*active),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Deletes a product that no order references.
pub async fn delete(db: &DbState, id: i64) -> Result<(), ApiError> {
    validate_id("id", id)?;
    db.inner().products().delete(id).await?;
    Ok(())
}

/// Adds `quantity` (negative to remove) to a product's stock.
pub async fn update_stock(db: &DbState, id: i64, quantity: i64) -> Result<Product, ApiError> {
    validate_id("id", id)?;

    let product = db.inner().products().adjust_stock(id, quantity).await?;
    info!(id, quantity, stock = product.stock, "Stock adjusted");
    Ok(product)
}

/// A fresh `PRD-NNNNNN-NNN` SKU suggestion.
pub fn generate_sku() -> String {
    product::generate_sku()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use cafe_db::{Database, DbConfig};
    use serde_json::json;

    async fn db() -> DbState {
        DbState::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    fn espresso() -> NewProduct {
        NewProduct {
            name: "Espresso".to_string(),
            price: 25.0,
            category: "Hot Drinks".to_string(),
            sku: "HOT-001".to_string(),
            stock: 4,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = db().await;
        let created = create(&db, espresso()).await.unwrap();

        let found = get_by_barcode(&db, " HOT-001 ").await.unwrap();
        assert_eq!(found.id, created.id);

        let listed = list(
            &db,
            ProductFilter {
                search: Some("  spres ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(listed.len(), 1);

        let err = get_by_barcode(&db, "HOT-999").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_create_validates() {
        let db = db().await;

        let mut product = espresso();
        product.price = -1.0;
        assert_eq!(create(&db, product).await.unwrap_err().code, ErrorCode::InvalidAmount);

        let mut product = espresso();
        product.name = String::new();
        assert_eq!(create(&db, product).await.unwrap_err().code, ErrorCode::ValidationError);

        create(&db, espresso()).await.unwrap();
        let err = create(&db, espresso()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("HOT-001"));
    }

    #[tokio::test]
    async fn test_toggle_hides_from_barcode() {
        let db = db().await;
        let id = create(&db, espresso()).await.unwrap().id;

        let product = update(&db, id, json!({"is_active": false})).await.unwrap();
        assert!(!product.is_active);
        assert!(get_by_barcode(&db, "HOT-001").await.is_err());

        let product = update(&db, id, json!({"is_active": 1})).await.unwrap();
        assert!(product.is_active);
    }

    #[tokio::test]
    async fn test_full_update() {
        let db = db().await;
        let id = create(&db, espresso()).await.unwrap().id;

        let product = update(
            &db,
            id,
            json!({
                "name": "Double Espresso",
                "price": 35.0,
                "category": "Hot Drinks",
                "sku": "HOT-002",
                "stock": 9,
                "is_active": true
            }),
        )
        .await
        .unwrap();
        assert_eq!(product.name, "Double Espresso");
        assert_eq!(product.stock, 9);

        let err = update(&db, id, json!({"name": "Half"})).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_stock_adjustment_floor() {
        let db = db().await;
        let id = create(&db, espresso()).await.unwrap().id;

        assert_eq!(update_stock(&db, id, 6).await.unwrap().stock, 10);
        assert_eq!(update_stock(&db, id, -10).await.unwrap().stock, 0);

        let err = update_stock(&db, id, -1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(get_by_id(&db, id).await.unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = db().await;
        let id = create(&db, espresso()).await.unwrap().id;

        delete(&db, id).await.unwrap();
        assert_eq!(get_by_id(&db, id).await.unwrap_err().code, ErrorCode::NotFound);
        assert_eq!(delete(&db, id).await.unwrap_err().code, ErrorCode::NotFound);
    }

    #[test]
    fn test_generated_sku_shape() {
        let sku = generate_sku();
        assert!(sku.starts_with("PRD-"));
        assert_eq!(sku.len(), "PRD-000000-000".len());
    }
}
