//! # Database State
//!
//! Wraps the `Database` handle used by every command.
//!
//! ## Thread Safety
//! `Database` holds a `SqlitePool` and the checkout lock, both shareable.
//! Read commands run concurrently; checkouts serialize on the lock.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn list(db: &DbState, filter: ProductFilter) -> Result<Vec<Product>, ApiError> {
//!     Ok(db.inner().products().list(&filter).await?)
//! }
//! ```

use cafe_db::Database;

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
