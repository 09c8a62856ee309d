//! # Commands Module
//!
//! Everything the register UI can ask for, one module per area.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here
//! ├── order.rs     ◄─── orders:create, print, list, getById, counter
//! ├── product.rs   ◄─── products:list, CRUD, stock, barcode, SKU
//! ├── user.rs      ◄─── users:login, logout, session, CRUD
//! ├── settings.rs  ◄─── settings:get, set, reset
//! └── report.rs    ◄─── reports:dailySummary, topProducts, sales, overview
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  {"channel": "products:getByBarcode", "args": ["HOT-001"]}             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ipc::dispatch ── deserializes positional args                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  product::get_by_barcode(db: &DbState, sku: &str)                      │
//! │      -> Result<Product, ApiError>                                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  {"success": true, "data": {...}}                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each command takes only the state it needs (`DbState`, `SessionState`,
//! `RegisterConfig`) so it can be called directly from tests.

pub mod order;
pub mod product;
pub mod report;
pub mod settings;
pub mod user;
