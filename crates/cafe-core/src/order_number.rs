//! # Order Numbers
//!
//! Human-readable order identifiers: `ORD-` followed by a zero-padded
//! sequence value (`ORD-000001`, `ORD-000042`).
//!
//! The sequence value itself comes from the store's counter row; this module
//! only formats and parses it. Values above 999999 simply grow wider.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Prefix of every canonical order number.
pub const ORDER_NUMBER_PREFIX: &str = "ORD-";

/// Minimum digit count after the prefix.
pub const ORDER_NUMBER_WIDTH: usize = 6;

/// A sequence value rendered as `ORD-NNNNNN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderNumber(u64);

impl OrderNumber {
    /// The first number handed out on an empty store.
    pub const FIRST: OrderNumber = OrderNumber(1);

    #[inline]
    pub const fn new(value: u64) -> Self {
        OrderNumber(value)
    }

    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The number following this one.
    #[inline]
    pub const fn next(&self) -> Self {
        OrderNumber(self.0 + 1)
    }

    /// Whether `s` is a canonical order number (prefix plus at least six
    /// digits, nothing else).
    pub fn is_canonical(s: &str) -> bool {
        s.parse::<OrderNumber>().is_ok()
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{ORDER_NUMBER_PREFIX}{:0width$}",
            self.0,
            width = ORDER_NUMBER_WIDTH
        )
    }
}

impl FromStr for OrderNumber {
    type Err = ValidationError;

    /// Strict parse. Legacy formats are rejected instead of guessed at.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "order_no".to_string(),
            reason: reason.to_string(),
        };

        let digits = s
            .strip_prefix(ORDER_NUMBER_PREFIX)
            .ok_or_else(|| invalid("must start with ORD-"))?;

        if digits.len() < ORDER_NUMBER_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("must be ORD- followed by at least 6 digits"));
        }

        digits
            .parse::<u64>()
            .map(OrderNumber)
            .map_err(|_| invalid("sequence value out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_to_six_digits() {
        assert_eq!(OrderNumber::FIRST.to_string(), "ORD-000001");
        assert_eq!(OrderNumber::new(42).to_string(), "ORD-000042");
        assert_eq!(OrderNumber::new(1_234_567).to_string(), "ORD-1234567");
    }

    #[test]
    fn test_parse_round_trips_display() {
        let n: OrderNumber = "ORD-000042".parse().unwrap();
        assert_eq!(n.value(), 42);
        assert_eq!(n.next().to_string(), "ORD-000043");
    }

    #[test]
    fn test_legacy_numbers_are_not_canonical() {
        assert!(OrderNumber::is_canonical("ORD-000001"));
        assert!(!OrderNumber::is_canonical("ORD-1700000000000-123"));
        assert!(!OrderNumber::is_canonical("ORD-12"));
        assert!(!OrderNumber::is_canonical("INV-000001"));
        assert!(!OrderNumber::is_canonical(""));
    }
}
