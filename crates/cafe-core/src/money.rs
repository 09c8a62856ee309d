//! # Money Module
//!
//! Helpers for the register's currency amounts.
//!
//! ## Amount Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AMOUNTS ARE PLAIN DECIMALS                                             │
//! │                                                                         │
//! │  Stored:     REAL columns (price, unit_price, subtotal, total, ...)     │
//! │  Computed:   f64, summed in cart-line order, never rounded              │
//! │  Compared:   within AMOUNT_TOLERANCE (0.005)                            │
//! │  Displayed:  two fraction digits ("12.50 EGP")                          │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │    approx_eq(0.1 + 0.2, 0.3)  → true                                    │
//! │    format_amount(0.1 + 0.2)   → "0.30"                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cafe_core::money::{approx_eq, format_currency, line_subtotal};
//!
//! let subtotal = line_subtotal(3, 12.5);
//! assert!(approx_eq(subtotal, 37.5));
//! assert_eq!(format_currency(subtotal, "EGP"), "37.50 EGP");
//! ```

use crate::AMOUNT_TOLERANCE;

// =============================================================================
// Arithmetic
// =============================================================================

/// Subtotal of one line: `qty * unit_price`.
#[inline]
pub fn line_subtotal(qty: i64, unit_price: f64) -> f64 {
    qty as f64 * unit_price
}

/// Sums `(qty, unit_price)` lines in iteration order.
///
/// Float addition is not associative, so callers that need a reproducible
/// result must pass lines in the order they were entered.
pub fn sum_subtotals<I>(lines: I) -> f64
where
    I: IntoIterator<Item = (i64, f64)>,
{
    lines
        .into_iter()
        .fold(0.0, |acc, (qty, unit_price)| acc + line_subtotal(qty, unit_price))
}

/// Whether two amounts are equal once rendered with two decimals.
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= AMOUNT_TOLERANCE
}

/// Whether `paid` falls short of `total`.
///
/// No tolerance: a stored order always has `paid >= total`.
#[inline]
pub fn is_underpaid(paid: f64, total: f64) -> bool {
    paid < total
}

// =============================================================================
// Formatting
// =============================================================================

/// Renders an amount with exactly two fraction digits.
///
/// ## Example
/// ```rust
/// use cafe_core::money::format_amount;
///
/// assert_eq!(format_amount(20.0), "20.00");
/// assert_eq!(format_amount(0.1 + 0.2), "0.30");
/// ```
pub fn format_amount(value: f64) -> String {
    // -0.00 reads badly on a receipt
    let value = if value.abs() < AMOUNT_TOLERANCE { 0.0 } else { value };
    format!("{value:.2}")
}

/// Renders an amount followed by the currency symbol.
pub fn format_currency(value: f64, symbol: &str) -> String {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        format_amount(value)
    } else {
        format!("{} {}", format_amount(value), symbol)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
