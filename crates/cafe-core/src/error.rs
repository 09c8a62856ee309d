//! # Error Types
//!
//! Domain-specific error types for cafe-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cafe-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cafe-db errors (separate crate)                                       │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── FulfillmentError - Checkout failures (Core | Store)               │
//! │                                                                         │
//! │  Register API errors (in app)                                          │
//! │  └── ApiError         - What the UI sees (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → UI           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::types::Shortage;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. None of them leave any
/// state behind: a checkout that fails with any of these commits nothing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// An amount is missing, non-numeric, non-finite or negative.
    #[error("Invalid {field}: {reason}")]
    InvalidAmount { field: String, reason: String },

    /// The supplied total disagrees with `subtotal - discount + tax`.
    #[error("Invalid total: expected {expected:.2}, got {actual:.2}")]
    TotalMismatch { expected: f64, actual: f64 },

    /// The customer paid less than the total.
    #[error("Insufficient payment: paid {paid:.2}, total {total:.2}")]
    InsufficientPayment { paid: f64, total: f64 },

    /// A cart line references a product that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// One or more lines exceed current stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout: Latte x3, Croissant x5, Tea x1
    ///      │
    ///      ▼
    /// Stock: Latte=1, Croissant=2, Tea=40
    ///      │
    ///      ▼
    /// InsufficientStock { shortages: [Latte, Croissant] }
    ///      │
    ///      ▼
    /// UI lists every short product at once
    /// ```
    #[error("Insufficient stock:\n{}", join_shortages(.shortages))]
    InsufficientStock { shortages: Vec<Shortage> },

    /// Username or password did not match.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Builds an [`CoreError::InvalidAmount`].
    pub fn invalid_amount(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidAmount {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Newline-joined shortage descriptions, one per product.
pub fn join_shortages(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed date, non-numeric text).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate SKU).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
