//! # Error Types
//!
//! Domain-specific error types for predio-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  predio-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  predio-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError         - HTTP status + {errors:[{message,code}]} body   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError → HTTP    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to exactly one HTTP status in the API layer

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Client referenced by a sale does not exist.
    #[error("Cliente not found: {0}")]
    ClientNotFound(String),

    /// Lot referenced by a sale does not exist.
    #[error("Lote not found: {0}")]
    LotNotFound(String),

    /// Seller referenced by a sale does not exist.
    #[error("Vendedor not found: {0}")]
    SellerNotFound(String),

    /// Sale does not exist.
    #[error("Venta not found: {0}")]
    SaleNotFound(String),

    /// Installment does not exist.
    #[error("Pago not found: {0}")]
    InstallmentNotFound(String),

    /// The lot is reserved or sold already.
    ///
    /// ## When This Occurs
    /// - A second sale races the first for the same lot; exactly one wins
    ///   the conditional `available → reserved` update, the loser sees this
    #[error("Lote {lot_id} is {status}, not available")]
    LotNotAvailable { lot_id: String, status: String },

    /// A monetary or schedule input is out of range.
    #[error("Invalid {field}: {reason}")]
    InvalidAmount { field: String, reason: String },

    /// Payment would overpay the installment.
    ///
    /// The ledger never accepts more than
    /// `amount_due + late_fee - amount_paid`; overpayment of one
    /// installment must be entered against the next one instead.
    #[error("Payment of {offered} exceeds remaining balance {remaining}")]
    ExceedsBalance { remaining: Money, offered: Money },

    /// No installment is left to pay for this sale.
    #[error("No pending installments for venta {0}")]
    NoPendingInstallments(String),

    /// An explicit installment id was given together with a sale it does
    /// not belong to.
    #[error("Pago {installment_id} does not belong to venta {sale_id}")]
    InvalidAssociation {
        installment_id: String,
        sale_id: String,
    },

    /// Attempt to edit an installment that is already fully paid.
    #[error("Pago {0} is already pagado and cannot be modified")]
    InstallmentClosed(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidAmount error.
    pub fn invalid_amount(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidAmount {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when request input doesn't meet requirements, before any
/// business logic (or transaction) runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., non-finite number, malformed date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
