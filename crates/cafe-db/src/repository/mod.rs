//! # Repository Module
//!
//! Store Gateway for the cafe register: typed reads and writes over the
//! `users`, `products`, `orders`, `order_items` and `settings` tables.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Register command                                                      │
//! │       │                                                                 │
//! │       │  db.products().list(&filter)                                   │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── list(&self, filter)                                               │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, product)                                            │
//! │  └── decrement_stock(conn, id, qty)   ← checkout transaction only      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Pool-backed methods take `&self`. Checkout primitives are associated │
//! │  functions over `&mut SqliteConnection` so they join the caller's     │
//! │  transaction.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Product CRUD, search and stock
//! - [`OrderRepository`] - Order reads, checkout inserts, maintenance
//! - [`UserRepository`] - Accounts, roles and login
//! - [`SettingsRepository`] - Key/value settings
//! - [`ReportRepository`] - Sales aggregates

pub mod order;
pub mod product;
pub mod report;
pub mod settings;
pub mod user;

pub use order::{NewOrder, OrderRepository};
pub use product::{ProductRepository, StockLevel};
pub use report::ReportRepository;
pub use settings::SettingsRepository;
pub use user::UserRepository;
