//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Listing with search / category filters
//! - Barcode (SKU) lookup
//! - CRUD operations
//! - Stock adjustments
//! - Checkout primitives that run on the checkout transaction
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read, compute, write back                                    │
//! │     SELECT stock → 5;  UPDATE products SET stock = 3                    │
//! │     (a concurrent checkout in between is lost)                          │
//! │                                                                         │
//! │  ✅ CORRECT: conditional delta                                          │
//! │     UPDATE products SET stock = stock - 2                               │
//! │     WHERE id = ? AND stock >= 2                                         │
//! │                                                                         │
//! │  Zero rows affected = not enough stock. Stock can never go negative.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use cafe_core::{NewProduct, Product, ProductFilter, ProductUpdate};

const PRODUCT_COLUMNS: &str = r#"
    id, name, price, category, image, sku, stock, is_active, created_at, updated_at
"#;

/// Name and stock of one product, as seen by the checkout transaction.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StockLevel {
    pub id: i64,
    pub name: String,
    pub stock: i64,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// // Grid listing
/// let products = repo.list(&ProductFilter::default()).await?;
///
/// // Barcode scan
/// let product = repo.find_active_by_sku("LATT-001").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products, sorted by name.
    ///
    /// ## Filters
    /// - `search`: substring of name or SKU
    /// - `category`: exact match
    /// - `include_inactive`: also return deactivated products
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        debug!(?search, ?category, include_inactive = filter.include_inactive, "Listing products");

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE (?1 OR is_active = 1)
              AND (?2 IS NULL OR name LIKE '%' || ?2 || '%' OR sku LIKE '%' || ?2 || '%')
              AND (?3 IS NULL OR category = ?3)
            ORDER BY name
            "#
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(filter.include_inactive)
            .bind(search)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its SKU, active or not.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Barcode lookup: an active product with exactly this SKU.
    pub async fn find_active_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        Ok(self.get_by_sku(sku).await?.filter(|p| p.is_active))
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated fields
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        debug!(sku = %product.sku, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (name, price, category, image, sku, stock)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(product.name.trim())
        .bind(product.price)
        .bind(product.category.trim())
        .bind(product.image.as_deref())
        .bind(product.sku.trim())
        .bind(product.stock)
        .execute(&self.pool)
        .await
        .map_err(|e| sku_conflict(e, &product.sku))?;

        let id = result.last_insert_rowid();
        info!(id, sku = %product.sku, "Product created");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Replaces a product's editable fields.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The updated product
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::UniqueViolation)` - New SKU belongs to another product
    pub async fn update(&self, id: i64, update: &ProductUpdate) -> DbResult<Product> {
        debug!(id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                price = ?3,
                category = ?4,
                image = ?5,
                sku = ?6,
                stock = ?7,
                is_active = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.trim())
        .bind(update.price)
        .bind(update.category.trim())
        .bind(update.image.as_deref())
        .bind(update.sku.trim())
        .bind(update.stock)
        .bind(update.is_active)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| sku_conflict(e, &update.sku))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Activates or deactivates a product.
    ///
    /// Deactivated products stay in order history but leave the grid.
    pub async fn set_active(&self, id: i64, active: bool) -> DbResult<()> {
        debug!(id, active, "Setting product active flag");

        let result = sqlx::query("UPDATE products SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now().naive_utc())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// Products that appear on any order can't be deleted; deactivate them
    /// instead.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::ForeignKeyViolation { .. } => DbError::Conflict(
                    "Product appears on existing orders; deactivate it instead".to_string(),
                ),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id, "Product deleted");
        Ok(())
    }

    /// Adds `delta` to a product's stock (negative to remove).
    ///
    /// ## Returns
    /// * `Ok(Product)` - The product with its new stock level
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::Conflict)` - Stock would drop below zero
    pub async fn adjust_stock(&self, id: i64, delta: i64) -> DbResult<Product> {
        debug!(id, delta, "Adjusting stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1 AND stock + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        let product = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::Conflict(format!(
                "Stock for {} cannot go below zero (current: {}, change: {})",
                product.name, product.stock, delta
            )));
        }

        Ok(product)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Checkout primitives (run on the checkout transaction)
    // =========================================================================

    /// Reads a product's current name and stock on `conn`.
    pub async fn fetch_stock_level(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> DbResult<Option<StockLevel>> {
        let level = sqlx::query_as::<_, StockLevel>(
            "SELECT id, name, stock FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(level)
    }

    /// Takes `qty` units from stock if, and only if, that many are on hand.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock decremented
    /// * `Ok(false)` - Not enough stock (or no such product); nothing changed
    pub async fn decrement_stock(conn: &mut SqliteConnection, id: i64, qty: i64) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2
            WHERE id = ?1 AND stock >= ?2
            "#,
        )
        .bind(id)
        .bind(qty)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// Maps a SKU UNIQUE violation to a duplicate error naming the SKU.
fn sku_conflict(err: sqlx::Error, sku: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("sku", sku.trim()),
        other => other,
    }
}

/// Generates a fresh SKU: `PRD-<6 digits>-<3 digits>`.
///
/// The first group comes from the clock, the second is random.
pub fn generate_sku() -> String {
    let millis = Utc::now().timestamp_millis().rem_euclid(1_000_000);
    let random = Uuid::new_v4().as_u128() % 1000;
    format!("PRD-{millis:06}-{random:03}")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_product(name: &str, sku: &str, category: &str, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price: 12.5,
            category: category.to_string(),
            sku: sku.to_string(),
            stock,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let repo = db.products();

        let product = repo
            .insert(&new_product("Latte", "LATT-001", "Hot Drinks", 10))
            .await
            .unwrap();
        assert!(product.id > 0);
        assert!(product.is_active);
        assert_eq!(product.stock, 10);

        let found = repo.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Latte");
        assert_eq!(found.price, 12.5);

        let by_sku = repo.get_by_sku("LATT-001").await.unwrap().unwrap();
        assert_eq!(by_sku.id, product.id);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&new_product("Latte", "LATT-001", "Hot Drinks", 1))
            .await
            .unwrap();
        let err = repo
            .insert(&new_product("Other", "LATT-001", "Hot Drinks", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "LATT-001"));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&new_product("Latte", "LATT-001", "Hot Drinks", 5))
            .await
            .unwrap();
        repo.insert(&new_product("Croissant", "CROI-001", "Pastries", 5))
            .await
            .unwrap();
        let tea = repo
            .insert(&new_product("Tea", "TEA-001", "Hot Drinks", 5))
            .await
            .unwrap();
        repo.set_active(tea.id, false).await.unwrap();

        let all = repo.list(&ProductFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Croissant");

        let hot = repo
            .list(&ProductFilter {
                category: Some("Hot Drinks".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hot.len(), 1);

        let search = repo
            .list(&ProductFilter {
                search: Some("croi".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(search.len(), 1);

        let with_inactive = repo
            .list(&ProductFilter {
                include_inactive: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(with_inactive.len(), 3);

        assert!(repo.find_active_by_sku("TEA-001").await.unwrap().is_none());
        assert!(repo.find_active_by_sku("LATT-001").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_product() {
        let db = db().await;
        let repo = db.products();

        let p = repo
            .insert(&new_product("Latte", "LATT-001", "Hot Drinks", 5))
            .await
            .unwrap();

        let updated = repo
            .update(
                p.id,
                &ProductUpdate {
                    name: "Oat Latte".to_string(),
                    price: 14.0,
                    category: "Hot Drinks".to_string(),
                    sku: "LATT-002".to_string(),
                    stock: 7,
                    image: None,
                    is_active: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Oat Latte");
        assert_eq!(updated.stock, 7);

        let missing = repo
            .update(
                9999,
                &ProductUpdate {
                    name: "X".to_string(),
                    price: 1.0,
                    category: "X".to_string(),
                    sku: "X-1".to_string(),
                    stock: 0,
                    image: None,
                    is_active: true,
                },
            )
            .await;
        assert!(matches!(missing, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_adjust_stock_never_negative() {
        let db = db().await;
        let repo = db.products();

        let p = repo
            .insert(&new_product("Latte", "LATT-001", "Hot Drinks", 5))
            .await
            .unwrap();

        let restocked = repo.adjust_stock(p.id, 10).await.unwrap();
        assert_eq!(restocked.stock, 15);

        let err = repo.adjust_stock(p.id, -20).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
        assert_eq!(repo.get_by_id(p.id).await.unwrap().unwrap().stock, 15);

        let err = repo.adjust_stock(9999, 1).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_product() {
        let db = db().await;
        let repo = db.products();

        let p = repo
            .insert(&new_product("Latte", "LATT-001", "Hot Drinks", 5))
            .await
            .unwrap();
        repo.delete(p.id).await.unwrap();
        assert!(repo.get_by_id(p.id).await.unwrap().is_none());
        assert!(repo.delete(p.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let db = db().await;
        let p = db
            .products()
            .insert(&new_product("Latte", "LATT-001", "Hot Drinks", 2))
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(ProductRepository::decrement_stock(&mut conn, p.id, 2).await.unwrap());
        assert!(!ProductRepository::decrement_stock(&mut conn, p.id, 1).await.unwrap());

        let level = ProductRepository::fetch_stock_level(&mut conn, p.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(level.stock, 0);
    }

    #[test]
    fn test_generate_sku_format() {
        let sku = generate_sku();
        assert_eq!(sku.len(), "PRD-123456-123".len());
        assert!(sku.starts_with("PRD-"));
        assert!(cafe_core::validation::validate_sku(&sku).is_ok());
    }
}
