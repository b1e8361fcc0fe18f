//! # Commission Scheduler
//!
//! Pure computation of seller commission records from a sale amount and the
//! seller's compensation scheme.
//!
//! ## Schemes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  porcentaje:  three milestone records splitting rate% of the sale      │
//! │               enganche 30% · contrato 30% · liquidación 40%            │
//! │               (split is policy-configurable)                           │
//! │                                                                         │
//! │  fijo:        one record, the seller's fixed amount, rate 0            │
//! │                                                                         │
//! │  mixto:       the three percentage records, plus the fixed record      │
//! │               when the fixed amount is > 0                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each record rounds independently; there is no cross-milestone
//! reconciliation (unlike the amortization schedule, where the final row
//! absorbs drift).

use chrono::NaiveDate;

use crate::money::Money;
use crate::policy::CommissionPolicy;
use crate::types::{CommissionKind, CommissionScheme, Seller};

/// One computed commission record, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionDraft {
    pub kind: CommissionKind,
    pub sale_amount: Money,
    pub commission: Money,

    /// Effective overall rate in bps (zero for fixed records).
    pub rate_bps: u32,

    /// When the commission becomes payable. Currently the scheduling date
    /// itself; milestone-linked dates are an open policy question.
    pub scheduled_payment_date: NaiveDate,
}

const MILESTONES: [CommissionKind; 3] = [
    CommissionKind::Enganche,
    CommissionKind::Contrato,
    CommissionKind::Liquidacion,
];

/// Computes the commission records for one sale.
///
/// `seller.commission_rate_bps` falls back to `policy.default_rate_bps`
/// when unset. A seller on `mixto` with a zero fixed amount yields only the
/// three percentage records.
pub fn build_commissions(
    seller: &Seller,
    sale_amount: Money,
    policy: &CommissionPolicy,
    today: NaiveDate,
) -> Vec<CommissionDraft> {
    let rate_bps = seller
        .commission_rate_bps
        .map(|bps| bps as u32)
        .unwrap_or(policy.default_rate_bps);

    let mut drafts = Vec::new();

    let percentage_rows = |drafts: &mut Vec<CommissionDraft>| {
        for (kind, split) in MILESTONES.iter().zip(policy.milestone_split_bps) {
            drafts.push(CommissionDraft {
                kind: *kind,
                sale_amount,
                commission: milestone_amount(sale_amount, rate_bps, split),
                rate_bps,
                scheduled_payment_date: today,
            });
        }
    };

    match seller.commission_scheme {
        CommissionScheme::Porcentaje => percentage_rows(&mut drafts),
        CommissionScheme::Fijo => drafts.push(fixed_row(seller, sale_amount, today)),
        CommissionScheme::Mixto => {
            percentage_rows(&mut drafts);
            if seller.fixed_commission_cents > 0 {
                drafts.push(fixed_row(seller, sale_amount, today));
            }
        }
    }

    drafts
}

fn fixed_row(seller: &Seller, sale_amount: Money, today: NaiveDate) -> CommissionDraft {
    CommissionDraft {
        kind: CommissionKind::Fijo,
        sale_amount,
        commission: Money::from_cents(seller.fixed_commission_cents),
        rate_bps: 0,
        scheduled_payment_date: today,
    }
}

/// `sale_amount × rate × milestone_fraction`, both factors in bps, rounded
/// half up in i128.
fn milestone_amount(sale_amount: Money, rate_bps: u32, split_bps: u32) -> Money {
    let num = sale_amount.cents() as i128 * rate_bps as i128 * split_bps as i128;
    let den: i128 = 10_000 * 10_000;
    Money::from_cents(((num + den / 2) / den) as i64)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::types::CommissionScheme;

    fn seller(scheme: CommissionScheme, rate_bps: Option<i64>, fixed_cents: i64) -> Seller {
        Seller {
            id: "vend-1".to_string(),
            name: "Vendedor Uno".to_string(),
            commission_scheme: scheme,
            commission_rate_bps: rate_bps,
            fixed_commission_cents: fixed_cents,
            created_at: Utc::now(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
    }

    #[test]
    fn test_porcentaje_splits_30_30_40() {
        // $150,000.00 sale at 5% -> total commission $7,500.00
        let drafts = build_commissions(
            &seller(CommissionScheme::Porcentaje, Some(500), 0),
            Money::from_cents(15_000_000),
            &CommissionPolicy::default(),
            today(),
        );

        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].kind, CommissionKind::Enganche);
        assert_eq!(drafts[0].commission.cents(), 225_000); // 30% of 7,500
        assert_eq!(drafts[1].kind, CommissionKind::Contrato);
        assert_eq!(drafts[1].commission.cents(), 225_000);
        assert_eq!(drafts[2].kind, CommissionKind::Liquidacion);
        assert_eq!(drafts[2].commission.cents(), 300_000); // 40% of 7,500

        let total: i64 = drafts.iter().map(|d| d.commission.cents()).sum();
        assert_eq!(total, 750_000);
    }

    #[test]
    fn test_porcentaje_sum_matches_rate_within_rounding() {
        // Awkward amount: each milestone rounds independently, so the sum
        // may drift from saleAmount*rate by at most one centavo per row.
        let sale = Money::from_cents(9_999_999);
        let drafts = build_commissions(
            &seller(CommissionScheme::Porcentaje, Some(500), 0),
            sale,
            &CommissionPolicy::default(),
            today(),
        );

        let total: i64 = drafts.iter().map(|d| d.commission.cents()).sum();
        let expected = sale.percent_bps(500).cents();
        assert!(
            (total - expected).abs() <= drafts.len() as i64,
            "total {total} vs expected {expected}"
        );
    }

    #[test]
    fn test_default_rate_when_seller_has_none() {
        let drafts = build_commissions(
            &seller(CommissionScheme::Porcentaje, None, 0),
            Money::from_cents(1_000_000),
            &CommissionPolicy::default(),
            today(),
        );

        // default 5%: $10,000.00 -> $500.00 split 150/150/200
        assert_eq!(drafts[0].rate_bps, 500);
        assert_eq!(drafts[0].commission.cents(), 15_000);
        assert_eq!(drafts[2].commission.cents(), 20_000);
    }

    #[test]
    fn test_fijo_single_record() {
        let drafts = build_commissions(
            &seller(CommissionScheme::Fijo, Some(500), 120_000),
            Money::from_cents(15_000_000),
            &CommissionPolicy::default(),
            today(),
        );

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].kind, CommissionKind::Fijo);
        assert_eq!(drafts[0].commission.cents(), 120_000);
        assert_eq!(drafts[0].rate_bps, 0);
    }

    #[test]
    fn test_mixto_appends_fixed_only_when_positive() {
        let with_fixed = build_commissions(
            &seller(CommissionScheme::Mixto, Some(400), 50_000),
            Money::from_cents(10_000_000),
            &CommissionPolicy::default(),
            today(),
        );
        assert_eq!(with_fixed.len(), 4);
        assert_eq!(with_fixed[3].kind, CommissionKind::Fijo);
        assert_eq!(with_fixed[3].commission.cents(), 50_000);

        let without_fixed = build_commissions(
            &seller(CommissionScheme::Mixto, Some(400), 0),
            Money::from_cents(10_000_000),
            &CommissionPolicy::default(),
            today(),
        );
        assert_eq!(without_fixed.len(), 3);
    }

    #[test]
    fn test_scheduled_payment_date_is_creation_date() {
        let drafts = build_commissions(
            &seller(CommissionScheme::Porcentaje, Some(500), 0),
            Money::from_cents(1_000_000),
            &CommissionPolicy::default(),
            today(),
        );
        assert!(drafts.iter().all(|d| d.scheduled_payment_date == today()));
    }
}
