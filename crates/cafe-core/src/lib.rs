//! # cafe-core: Pure Business Logic for the Cafe Register
//!
//! This crate is the **heart** of the register. It contains the business rules
//! for carts, amounts, order numbers and receipts as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cafe Register Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Register UI (external)                          │   │
//! │  │    Product Grid ──► Cart ──► Payment ──► Receipt               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON request/response                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 cafe-register (commands)                        │   │
//! │  │    orders:create, products:list, reports:dailySummary, ...     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cafe-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │order_number│ │ validation│  │   │
//! │  │   │  Product  │  │  amounts  │  │ ORD-000042 │ │ cart rules│  │   │
//! │  │   │  Order    │  │  format   │  │            │ │  coercion │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            cafe-db (Store Gateway + Fulfillment)                │   │
//! │  │          SQLite queries, migrations, transactions               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Cart, User, report rows)
//! - [`money`] - Amount helpers (line subtotals, tolerance, formatting)
//! - [`order_number`] - The `ORD-NNNNNN` order number
//! - [`receipt`] - Receipt structure and plain-text rendering
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Amounts
//! Currency values are plain `f64` decimal amounts, exactly as the register
//! stores them. The core never rounds; two decimals are a presentation
//! concern (see [`money::format_amount`]). Equality between computed and
//! supplied amounts uses [`AMOUNT_TOLERANCE`].
//!
//! ## Example Usage
//!
//! ```rust
//! use cafe_core::{Cart, CartLine, PaymentMethod};
//! use cafe_core::validation::validate_cart;
//!
//! let cart = Cart {
//!     items: vec![CartLine { product_id: 1, qty: 2, unit_price: 10.0 }],
//!     total: 20.0,
//!     discount: 0.0,
//!     tax: 0.0,
//!     paid: 20.0,
//!     payment_method: PaymentMethod::Cash,
//!     user_id: 1,
//! };
//!
//! assert!(validate_cart(&cart).is_ok());
//! assert_eq!(cart.change(), 0.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod order_number;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use order_number::OrderNumber;
pub use receipt::{Receipt, ReceiptLine, ReceiptSettings};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest difference at which two currency amounts are considered equal.
///
/// Half of the smallest displayed unit: anything below it is invisible once
/// amounts are rendered with two fraction digits.
pub const AMOUNT_TOLERANCE: f64 = 0.005;

/// Username of the account created on first start.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Settings written on first start and restored by a settings reset.
///
/// Keys are the ones the register UI and the receipt builder read.
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("cafe_name", "Corner Cafe"),
    ("cafe_address", ""),
    ("cafe_phone", ""),
    ("currency", "Egyptian Pound"),
    ("currency_symbol", "EGP"),
    ("tax_rate", "15"),
    ("receipt_header", "Welcome to Corner Cafe"),
    ("receipt_footer", "Thank you for visiting"),
    ("paper_size", "80mm"),
    ("theme", "light"),
    ("language", "en"),
    ("printer_name", ""),
    ("auto_print", "0"),
    ("sound_enabled", "1"),
];
