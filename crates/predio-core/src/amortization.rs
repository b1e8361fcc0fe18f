//! # Amortization Generator
//!
//! Pure computation of an installment schedule from principal, term and
//! annual rate. No I/O: the caller persists the rows.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  monthly_rate = annual_rate / 100 / 12                                  │
//! │                                                                         │
//! │  rate == 0:  payment = principal / n        (flat split)                │
//! │  rate  > 0:  payment = P·i·(1+i)^n / ((1+i)^n − 1)   (annuity)          │
//! │                                                                         │
//! │  per row i = 1..n:                                                      │
//! │    interest   = balance · monthly_rate                                  │
//! │    principal  = payment − interest                                      │
//! │    closing    = balance − principal                                     │
//! │                                                                         │
//! │  FINAL ROW RULE: principal = remaining balance, amount_due is derived   │
//! │  from principal + interest — never from the formula's raw output — so   │
//! │  the running balance lands on exactly zero despite rounding drift.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The formula runs in f64; every row rounds to centavos exactly once, at
//! construction. The final-row rule makes the schedule conserve principal:
//! `sum(principal) == principal` holds exactly for every valid input.

use chrono::{Months, NaiveDate};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::InterestRate;

/// One computed schedule row, before persistence.
///
/// The db layer turns these into `Installment` records (assigning ids,
/// timestamps and payment-tracking fields).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRow {
    /// 1-based installment number.
    pub number: u32,

    /// `start_date + number` months.
    pub due_date: NaiveDate,

    pub opening_balance: Money,
    pub amount_due: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

/// Computes the full amortization schedule.
///
/// ## Arguments
/// * `principal` - financed amount (total − down payment), must be ≥ 0
/// * `term_months` - number of installments, must be ≥ 1
/// * `rate` - annual interest rate
/// * `start_date` - sale date; installment `i` falls due `i` months later
///
/// ## Errors
/// * `InvalidAmount` for a zero term or negative principal
///
/// Re-invocation is a full overwrite: the output is always exactly
/// `term_months` rows, never a partial schedule.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use predio_core::amortization::build_schedule;
/// use predio_core::money::Money;
/// use predio_core::types::InterestRate;
///
/// let start = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
/// let rows = build_schedule(
///     Money::from_cents(9_000_000), // $90,000.00
///     12,
///     InterestRate::from_percentage(10.0),
///     start,
/// )
/// .unwrap();
///
/// assert_eq!(rows.len(), 12);
/// assert_eq!(rows[0].amount_due.cents(), 791_243); // $7,912.43
/// assert!(rows[11].closing_balance.is_zero());
/// ```
pub fn build_schedule(
    principal: Money,
    term_months: u32,
    rate: InterestRate,
    start_date: NaiveDate,
) -> CoreResult<Vec<ScheduleRow>> {
    if term_months == 0 {
        return Err(CoreError::invalid_amount(
            "plazo_meses",
            "term must be at least 1 month",
        ));
    }
    if principal.is_negative() {
        return Err(CoreError::invalid_amount(
            "principal",
            format!("financed amount {principal} is negative"),
        ));
    }

    let n = term_months;
    let monthly = rate.monthly();
    let mut balance = principal.cents();
    let mut rows = Vec::with_capacity(n as usize);

    // Level payment in centavos, rounded once. For zero-rate financing this
    // is a flat split; otherwise the standard annuity payment.
    let payment_cents = if rate.is_zero() {
        (principal.cents() as f64 / n as f64).round() as i64
    } else {
        let p = principal.cents() as f64;
        let factor = (1.0 + monthly).powi(n as i32);
        (p * monthly * factor / (factor - 1.0)).round() as i64
    };

    for i in 1..=n {
        let due_date = start_date
            .checked_add_months(Months::new(i))
            .ok_or_else(|| {
                CoreError::Validation(ValidationError::InvalidFormat {
                    field: "due_date".to_string(),
                    reason: format!("date overflow at installment {i}"),
                })
            })?;

        let interest = ((balance as f64) * monthly).round() as i64;

        let (principal_portion, amount_due) = if i < n {
            (payment_cents - interest, payment_cents)
        } else {
            // Final row absorbs all rounding drift: pay off whatever balance
            // is left, and derive the amount due from it.
            (balance, balance + interest)
        };

        let closing = balance - principal_portion;

        rows.push(ScheduleRow {
            number: i,
            due_date,
            opening_balance: Money::from_cents(balance),
            amount_due: Money::from_cents(amount_due),
            interest: Money::from_cents(interest),
            principal: Money::from_cents(principal_portion),
            closing_balance: Money::from_cents(closing),
        });

        balance = closing;
    }

    Ok(rows)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[test]
    fn test_reference_vector_90k_12m_10pct() {
        // principal=90000, term=12, annualRate=10 -> payment ≈ 7912.43
        let rows = build_schedule(
            Money::from_cents(9_000_000),
            12,
            InterestRate::from_percentage(10.0),
            start(),
        )
        .unwrap();

        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].amount_due.cents(), 791_243);
        // first month interest: 90000 * 10%/12 = 750.00
        assert_eq!(rows[0].interest.cents(), 75_000);
        assert_eq!(rows[0].principal.cents(), 716_243);
    }

    #[test]
    fn test_zero_rate_flat_split() {
        // principal=12000, term=12, rate=0 -> payment=1000.00 each month
        let rows = build_schedule(
            Money::from_cents(1_200_000),
            12,
            InterestRate::zero(),
            start(),
        )
        .unwrap();

        assert_eq!(rows.len(), 12);
        for row in &rows {
            assert_eq!(row.amount_due.cents(), 100_000);
            assert_eq!(row.interest.cents(), 0);
        }
        assert!(rows[11].closing_balance.is_zero());
    }

    #[test]
    fn test_zero_rate_final_row_absorbs_remainder() {
        // $100.00 over 3 months: 33.33 + 33.33 + 33.34
        let rows = build_schedule(Money::from_cents(10_000), 3, InterestRate::zero(), start())
            .unwrap();

        assert_eq!(rows[0].amount_due.cents(), 3_333);
        assert_eq!(rows[1].amount_due.cents(), 3_333);
        assert_eq!(rows[2].amount_due.cents(), 3_334);

        let total: i64 = rows.iter().map(|r| r.amount_due.cents()).sum();
        assert_eq!(total, 10_000);
    }

    #[test]
    fn test_balances_chain_and_land_on_zero() {
        for (principal, term, pct) in [
            (9_000_000, 12, 10.0),
            (15_000_000, 60, 12.5),
            (1_234_567, 7, 9.9),
            (50_000_00, 240, 8.0),
            (10_000, 3, 0.0),
        ] {
            let rows = build_schedule(
                Money::from_cents(principal),
                term,
                InterestRate::from_percentage(pct),
                start(),
            )
            .unwrap();

            assert_eq!(rows.len(), term as usize);
            assert_eq!(rows[0].opening_balance.cents(), principal);
            for pair in rows.windows(2) {
                assert_eq!(
                    pair[0].closing_balance, pair[1].opening_balance,
                    "balances must chain for principal={principal} term={term} rate={pct}"
                );
            }
            assert!(
                rows.last().unwrap().closing_balance.is_zero(),
                "final balance must be exactly zero for principal={principal} term={term} rate={pct}"
            );

            // Principal is conserved exactly, regardless of rate.
            let repaid: i64 = rows.iter().map(|r| r.principal.cents()).sum();
            assert_eq!(repaid, principal);

            // Each row's amount splits into interest + principal.
            for row in &rows {
                assert_eq!(
                    row.amount_due.cents(),
                    row.interest.cents() + row.principal.cents()
                );
            }
        }
    }

    #[test]
    fn test_zero_rate_amount_due_sums_to_principal() {
        let principal = 1_234_567;
        let rows =
            build_schedule(Money::from_cents(principal), 11, InterestRate::zero(), start())
                .unwrap();
        let total: i64 = rows.iter().map(|r| r.amount_due.cents()).sum();
        assert!((total - principal).abs() <= 1);
    }

    #[test]
    fn test_due_dates_advance_monthly() {
        let rows = build_schedule(
            Money::from_cents(100_000),
            3,
            InterestRate::zero(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        )
        .unwrap();

        // chrono clamps to the end of shorter months
        assert_eq!(rows[0].due_date, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(rows[1].due_date, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
        assert_eq!(rows[2].due_date, NaiveDate::from_ymd_opt(2026, 4, 30).unwrap());
    }

    #[test]
    fn test_single_installment() {
        let rows = build_schedule(
            Money::from_cents(100_000),
            1,
            InterestRate::from_percentage(12.0),
            start(),
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        // one month of interest at 1%
        assert_eq!(rows[0].interest.cents(), 1_000);
        assert_eq!(rows[0].principal.cents(), 100_000);
        assert_eq!(rows[0].amount_due.cents(), 101_000);
        assert!(rows[0].closing_balance.is_zero());
    }

    #[test]
    fn test_zero_principal_produces_zero_rows_not_error() {
        // A fully-paid-up-front financed sale has nothing to amortize, but
        // the generator itself still emits a well-formed (all-zero) schedule.
        let rows = build_schedule(
            Money::zero(),
            6,
            InterestRate::from_percentage(10.0),
            start(),
        )
        .unwrap();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.amount_due.is_zero()));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            build_schedule(Money::from_cents(1_000), 0, InterestRate::zero(), start()),
            Err(CoreError::InvalidAmount { .. })
        ));
        assert!(matches!(
            build_schedule(Money::from_cents(-1), 12, InterestRate::zero(), start()),
            Err(CoreError::InvalidAmount { .. })
        ));
    }
}
