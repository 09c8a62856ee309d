//! # cafe-db: Store Gateway and Order Fulfillment
//!
//! Database access for the cafe register, plus the checkout transaction
//! that turns a cart into an order. SQLite via sqlx, async on tokio.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Cafe Register Data Flow                             │
//! │                                                                         │
//! │  Register command (orders:create)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     cafe-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ product/order │    │  (embedded)  │  │   │
//! │  │   │               │    │ user/settings │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ report        │    │ 001_init.sql │  │   │
//! │  │   │ checkout lock │    └───────▲───────┘    │ 002_seq.sql  │  │   │
//! │  │   └───────┬───────┘            │            └──────────────┘  │   │
//! │  │           │            ┌───────┴───────┐                      │   │
//! │  │           └───────────►│  fulfillment  │ allocator, stock,    │   │
//! │  │                        │               │ orchestrator         │   │
//! │  │                        └───────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Store Gateway repositories
//! - [`fulfillment`] - Order number allocation, stock validation, checkout
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cafe_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/cafe.db")).await?;
//!
//! let menu = db.products().list(&ProductFilter::default()).await?;
//! let result = db.fulfillment().create_order(&cart).await?;
//! println!("{} change {}", result.order_no, result.change);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fulfillment;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use fulfillment::{FulfillmentError, OrderFulfillment};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    NewOrder, OrderRepository, ProductRepository, ReportRepository, SettingsRepository,
    UserRepository,
};
