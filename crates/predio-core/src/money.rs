//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In a 240-month amortization schedule that error compounds row by      │
//! │  row until the closing balance never reaches zero.                     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    Every persisted monetary value is an i64 count of the smallest      │
//! │    currency unit. The annuity formula still runs in f64, but rounds    │
//! │    to centavos exactly once per row, and the final row absorbs the     │
//! │    residue so the balance lands on 0 by construction.                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (centavos).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate ledger math may go negative (e.g. the
///   remaining-balance check), even though persisted amounts never do
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as a bare number**: the wire format is centavos, the same
///   unit the payment processor reports
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use predio_core::money::Money;
    ///
    /// let price = Money::from_cents(1_500_000_00); // $1,500,000.00
    /// assert_eq!(price.cents(), 1_500_000_00);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a decimal amount in major units (pesos),
    /// rounding half away from zero to the nearest centavo.
    ///
    /// This is the entry point for API payloads, which carry decimal
    /// amounts (`"montoEnganche": 10000.50`). Everything downstream of the
    /// boundary works in centavos.
    ///
    /// ## Example
    /// ```rust
    /// use predio_core::money::Money;
    ///
    /// assert_eq!(Money::from_f64(10000.50).cents(), 1_000_050);
    /// assert_eq!(Money::from_f64(0.005).cents(), 1);
    /// ```
    #[inline]
    pub fn from_f64(amount: f64) -> Self {
        Money((amount * 100.0).round() as i64)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value as a decimal amount in major units (display only).
    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a basis-point rate to this amount, rounding half up.
    ///
    /// Used for the one-shot late fee (`amount_due.percent_bps(500)` = 5%)
    /// and for commission milestones.
    ///
    /// ## Implementation
    /// Integer math in i128: `(cents * bps + 5000) / 10000`.
    /// The +5000 provides half-up rounding (5000/10000 = 0.5) without ever
    /// touching floating point.
    ///
    /// ## Example
    /// ```rust
    /// use predio_core::money::Money;
    ///
    /// let due = Money::from_cents(7_912_43); // $7,912.43
    /// assert_eq!(due.percent_bps(500).cents(), 395_62); // 5% late fee
    /// ```
    pub fn percent_bps(&self, bps: u32) -> Money {
        // i128 to prevent overflow on large amounts
        let cents = (self.0 as i128 * bps as i128 + 5_000) / 10_000;
        Money::from_cents(cents as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// For logs and error messages. The front end formats its own numbers.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
