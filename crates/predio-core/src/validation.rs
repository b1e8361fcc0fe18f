//! # Validation Module
//!
//! Input validation for request payloads, run before any transaction opens.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP deserialization (serde)                                  │
//! │  ├── Type shape, required fields                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Amount/range rules, before a transaction is opened                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── CHECK / UNIQUE / FK constraints                                    │
//! │                                                                         │
//! │  Defense in depth: each layer catches different errors                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest financing term accepted (50 years).
pub const MAX_TERM_MONTHS: i64 = 600;

/// Highest annual rate accepted: 100%.
pub const MAX_ANNUAL_RATE_BPS: i64 = 10_000;

/// Validates a decimal money amount arriving from the API.
///
/// Rejects NaN/infinity (serde_json accepts them from some producers) and
/// negative values.
pub fn validate_amount(field: &str, amount: f64) -> ValidationResult<()> {
    if !amount.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    if amount < 0.0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a payment amount: finite and strictly positive.
pub fn validate_payment_amount(field: &str, amount: f64) -> ValidationResult<()> {
    validate_amount(field, amount)?;
    if amount <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a financing term. Zero is allowed (unfinanced sale).
pub fn validate_term_months(term: i64) -> ValidationResult<()> {
    if !(0..=MAX_TERM_MONTHS).contains(&term) {
        return Err(ValidationError::OutOfRange {
            field: "plazo_meses".to_string(),
            min: 0,
            max: MAX_TERM_MONTHS,
        });
    }
    Ok(())
}

/// Validates an annual interest rate given as a percentage.
pub fn validate_annual_rate(pct: f64) -> ValidationResult<()> {
    if !pct.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "tasa_interes".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    let bps = (pct * 100.0).round() as i64;
    if !(0..=MAX_ANNUAL_RATE_BPS).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "tasa_interes".to_string(),
            min: 0,
            max: MAX_ANNUAL_RATE_BPS / 100,
        });
    }
    Ok(())
}

/// Validates that a referenced id is non-empty.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_rules() {
        assert!(validate_amount("monto", 0.0).is_ok());
        assert!(validate_amount("monto", 1500.75).is_ok());
        assert!(validate_amount("monto", -0.01).is_err());
        assert!(validate_amount("monto", f64::NAN).is_err());
        assert!(validate_amount("monto", f64::INFINITY).is_err());
    }

    #[test]
    fn test_payment_amount_must_be_positive() {
        assert!(validate_payment_amount("monto", 10.0).is_ok());
        assert!(validate_payment_amount("monto", 0.0).is_err());
        assert!(validate_payment_amount("monto", -5.0).is_err());
    }

    #[test]
    fn test_term_range() {
        assert!(validate_term_months(0).is_ok());
        assert!(validate_term_months(12).is_ok());
        assert!(validate_term_months(600).is_ok());
        assert!(validate_term_months(601).is_err());
        assert!(validate_term_months(-1).is_err());
    }

    #[test]
    fn test_rate_range() {
        assert!(validate_annual_rate(0.0).is_ok());
        assert!(validate_annual_rate(10.0).is_ok());
        assert!(validate_annual_rate(100.0).is_ok());
        assert!(validate_annual_rate(100.01).is_err());
        assert!(validate_annual_rate(-1.0).is_err());
        assert!(validate_annual_rate(f64::NAN).is_err());
    }

    #[test]
    fn test_id_required() {
        assert!(validate_id("cliente_id", "c-123").is_ok());
        assert!(validate_id("cliente_id", "").is_err());
        assert!(validate_id("cliente_id", "   ").is_err());
    }
}
