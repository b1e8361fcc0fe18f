//! # Payment Ledger
//!
//! Applies monetary amounts to installments — manual entries and
//! processor-confirmed payments share the same posting path.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │           pendiente ──► parcial ──► pagado (terminal)                   │
//! │                                                                         │
//! │  Per payment, inside one transaction:                                   │
//! │    1. resolve the target installment                                    │
//! │    2. remaining = amount_due + late_fee − amount_paid                   │
//! │       amount > remaining            → ExceedsBalance                    │
//! │    3. paid after due date and no fee yet → late_fee = 5% of amount_due  │
//! │       (one-shot: never re-applied)                                      │
//! │    4. amount_paid += amount; status per the totals                      │
//! │    5. notes appended (newline-joined)                                   │
//! │    6. no unpaid installment left     → sale liquidado, lot sold         │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Step 6 runs inside the same transaction as 1-5 so concurrent payments  │
//! │  serialize on the database write lock and the liquidation flip is      │
//! │  atomic with the payment that caused it.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use tracing::info;

use crate::pool::Database;
use crate::service::ServiceResult;
use predio_core::{
    CoreError, Installment, InstallmentStatus, LedgerPolicy, LotStatus, Money,
};

/// How the caller identifies the installment to pay.
///
/// Typed dispatch instead of an ad hoc bag of optional fields: the API
/// layer maps its request shape onto exactly one of these.
#[derive(Debug, Clone)]
pub enum PaymentTarget {
    /// Explicit installment id, optionally cross-checked against a sale.
    Installment {
        installment_id: String,
        sale_id: Option<String>,
    },
    /// A specific installment of a sale by number.
    SaleInstallment { sale_id: String, number: i64 },
    /// The oldest installment of the sale not yet fully paid.
    OldestUnpaid { sale_id: String },
}

/// One payment to post.
#[derive(Debug, Clone)]
pub struct PaymentEntry {
    pub amount: Money,
    pub paid_on: NaiveDate,
    pub notes: Option<String>,
}

/// The payment ledger service.
#[derive(Debug, Clone)]
pub struct PaymentLedger {
    db: Database,
    policy: LedgerPolicy,
}

impl PaymentLedger {
    /// Creates the ledger with its late-fee policy.
    pub fn new(db: Database, policy: LedgerPolicy) -> Self {
        PaymentLedger { db, policy }
    }

    /// Applies a manual payment to an installment.
    pub async fn apply_payment(
        &self,
        target: PaymentTarget,
        entry: PaymentEntry,
    ) -> ServiceResult<Installment> {
        if !entry.amount.is_positive() {
            return Err(CoreError::invalid_amount(
                "monto",
                format!("payment amount {} must be positive", entry.amount),
            )
            .into());
        }

        let mut tx = self.db.begin().await?;

        let installment = self.resolve(&mut tx, &target).await?;
        let updated = post_amount(
            &mut tx,
            &self.db,
            &self.policy,
            installment,
            entry.amount,
            entry.paid_on,
            entry.notes.as_deref(),
        )
        .await?;
        settle_sale_if_paid(&mut tx, &self.db, &updated.sale_id).await?;

        tx.commit().await?;

        info!(
            installment_id = %updated.id,
            sale_id = %updated.sale_id,
            amount = entry.amount.cents(),
            status = ?updated.status,
            "Pago applied"
        );

        Ok(updated)
    }

    /// Resolves the payment target to a concrete installment row.
    async fn resolve(
        &self,
        conn: &mut SqliteConnection,
        target: &PaymentTarget,
    ) -> ServiceResult<Installment> {
        let repo = self.db.installments();

        match target {
            PaymentTarget::Installment {
                installment_id,
                sale_id,
            } => {
                let installment = repo
                    .get_by_id_tx(conn, installment_id)
                    .await?
                    .ok_or_else(|| CoreError::InstallmentNotFound(installment_id.clone()))?;

                if let Some(sale_id) = sale_id {
                    if installment.sale_id != *sale_id {
                        return Err(CoreError::InvalidAssociation {
                            installment_id: installment_id.clone(),
                            sale_id: sale_id.clone(),
                        }
                        .into());
                    }
                }
                Ok(installment)
            }

            PaymentTarget::SaleInstallment { sale_id, number } => repo
                .get_by_sale_and_number_tx(conn, sale_id, *number)
                .await?
                .ok_or_else(|| {
                    CoreError::InstallmentNotFound(format!("{sale_id}#{number}")).into()
                }),

            PaymentTarget::OldestUnpaid { sale_id } => repo
                .oldest_unpaid_tx(conn, sale_id)
                .await?
                .ok_or_else(|| CoreError::NoPendingInstallments(sale_id.clone()).into()),
        }
    }
}

/// Posts an amount against an installment. Shared by the manual path and
/// the webhook reconciler; the caller owns the transaction.
pub(crate) async fn post_amount(
    conn: &mut SqliteConnection,
    db: &Database,
    policy: &LedgerPolicy,
    mut installment: Installment,
    amount: Money,
    paid_on: NaiveDate,
    note: Option<&str>,
) -> ServiceResult<Installment> {
    // Balance check runs against the fee as it stands; the late fee below
    // only grows what the *next* payment has to cover.
    let remaining = installment.remaining();
    if amount > remaining {
        return Err(CoreError::ExceedsBalance {
            remaining,
            offered: amount,
        }
        .into());
    }

    // One-shot late fee: applied on the first late payment, never again.
    if paid_on > installment.due_date && installment.late_fee_cents == 0 {
        installment.late_fee_cents = Money::from_cents(installment.amount_due_cents)
            .percent_bps(policy.late_fee_bps)
            .cents();
    }

    installment.amount_paid_cents += amount.cents();
    installment.status =
        if installment.amount_paid_cents >= installment.amount_due_cents + installment.late_fee_cents
        {
            InstallmentStatus::Pagado
        } else {
            InstallmentStatus::Parcial
        };

    if let Some(note) = note {
        installment.notes = Some(match installment.notes.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{note}"),
            _ => note.to_string(),
        });
    }

    db.installments().record_payment(conn, &installment).await?;

    Ok(installment)
}

/// Liquidation detection: when no unpaid installment remains, the sale is
/// `liquidado` and its lot `sold`. The conditional UPDATE inside
/// `mark_liquidated` guarantees the flip happens exactly once.
pub(crate) async fn settle_sale_if_paid(
    conn: &mut SqliteConnection,
    db: &Database,
    sale_id: &str,
) -> ServiceResult<()> {
    if db.installments().unsettled_count_tx(conn, sale_id).await? > 0 {
        return Ok(());
    }

    if db.sales().mark_liquidated(conn, sale_id).await? {
        if let Some(sale) = db.sales().get_by_id_tx(conn, sale_id).await? {
            db.lots()
                .set_status(conn, &sale.lot_id, LotStatus::Sold)
                .await?;
        }
        info!(sale_id = %sale_id, "Venta liquidada");
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::originator::{NewSale, SaleOriginator};
    use crate::service::ServiceError;
    use crate::testutil::{seed_client, seed_lot, test_db};
    use predio_core::{CommissionPolicy, InterestRate, SaleStatus};

    async fn financed_sale(db: &Database, term: u32) -> predio_core::Sale {
        let client = seed_client(db).await;
        let lot = seed_lot(db, 15_000_000).await;

        SaleOriginator::new(db.clone(), CommissionPolicy::default())
            .create_sale(NewSale {
                client_id: client.id,
                lot_id: lot.id,
                seller_id: None,
                down_payment: Money::from_cents(3_000_000),
                term_months: term,
                annual_rate: InterestRate::zero(),
                sale_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            })
            .await
            .unwrap()
    }

    fn on(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(amount_cents: i64, paid_on: NaiveDate) -> PaymentEntry {
        PaymentEntry {
            amount: Money::from_cents(amount_cents),
            paid_on,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_partial_then_full_payment() {
        let db = test_db().await;
        // 12,000,000 over 12 months at 0% -> 1,000,000 per installment
        let sale = financed_sale(&db, 12).await;
        let ledger = PaymentLedger::new(db.clone(), LedgerPolicy::default());

        let first = ledger
            .apply_payment(
                PaymentTarget::OldestUnpaid {
                    sale_id: sale.id.clone(),
                },
                entry(400_000, on(2026, 2, 20)),
            )
            .await
            .unwrap();

        assert_eq!(first.installment_number, 1);
        assert_eq!(first.status, InstallmentStatus::Parcial);
        assert_eq!(first.amount_paid_cents, 400_000);
        assert_eq!(first.late_fee_cents, 0);

        let second = ledger
            .apply_payment(
                PaymentTarget::OldestUnpaid {
                    sale_id: sale.id.clone(),
                },
                entry(600_000, on(2026, 2, 25)),
            )
            .await
            .unwrap();

        // same installment: oldest unpaid is still #1 until pagado
        assert_eq!(second.installment_number, 1);
        assert_eq!(second.status, InstallmentStatus::Pagado);
        assert_eq!(second.amount_paid_cents, 1_000_000);
    }

    #[tokio::test]
    async fn test_overpayment_rejected() {
        let db = test_db().await;
        let sale = financed_sale(&db, 12).await;
        let ledger = PaymentLedger::new(db.clone(), LedgerPolicy::default());

        let err = ledger
            .apply_payment(
                PaymentTarget::OldestUnpaid {
                    sale_id: sale.id.clone(),
                },
                entry(1_000_001, on(2026, 2, 20)),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::ExceedsBalance { .. })
        ));

        // rejected payment left no trace
        let rows = db.installments().list_by_sale(&sale.id).await.unwrap();
        assert_eq!(rows[0].amount_paid_cents, 0);
        assert_eq!(rows[0].status, InstallmentStatus::Pendiente);
    }

    #[tokio::test]
    async fn test_late_fee_applied_once() {
        let db = test_db().await;
        let sale = financed_sale(&db, 12).await;
        let ledger = PaymentLedger::new(db.clone(), LedgerPolicy::default());

        // installment #1 falls due 2026-03-01; pay late twice
        let first = ledger
            .apply_payment(
                PaymentTarget::SaleInstallment {
                    sale_id: sale.id.clone(),
                    number: 1,
                },
                entry(500_000, on(2026, 3, 15)),
            )
            .await
            .unwrap();

        // 5% of 1,000,000
        assert_eq!(first.late_fee_cents, 50_000);
        assert_eq!(first.status, InstallmentStatus::Parcial);

        let second = ledger
            .apply_payment(
                PaymentTarget::SaleInstallment {
                    sale_id: sale.id.clone(),
                    number: 1,
                },
                entry(550_000, on(2026, 4, 15)),
            )
            .await
            .unwrap();

        // fee unchanged on the second late payment; now settled in full
        assert_eq!(second.late_fee_cents, 50_000);
        assert_eq!(second.amount_paid_cents, 1_050_000);
        assert_eq!(second.status, InstallmentStatus::Pagado);
    }

    #[tokio::test]
    async fn test_on_time_payment_has_no_fee() {
        let db = test_db().await;
        let sale = financed_sale(&db, 12).await;
        let ledger = PaymentLedger::new(db.clone(), LedgerPolicy::default());

        let paid = ledger
            .apply_payment(
                PaymentTarget::SaleInstallment {
                    sale_id: sale.id.clone(),
                    number: 1,
                },
                entry(1_000_000, on(2026, 3, 1)), // exactly on the due date
            )
            .await
            .unwrap();

        assert_eq!(paid.late_fee_cents, 0);
        assert_eq!(paid.status, InstallmentStatus::Pagado);
    }

    #[tokio::test]
    async fn test_pagado_is_terminal() {
        let db = test_db().await;
        let sale = financed_sale(&db, 12).await;
        let ledger = PaymentLedger::new(db.clone(), LedgerPolicy::default());

        let paid = ledger
            .apply_payment(
                PaymentTarget::SaleInstallment {
                    sale_id: sale.id.clone(),
                    number: 1,
                },
                entry(1_000_000, on(2026, 2, 20)),
            )
            .await
            .unwrap();
        assert_eq!(paid.status, InstallmentStatus::Pagado);

        // any further amount against the settled installment overpays
        let err = ledger
            .apply_payment(
                PaymentTarget::Installment {
                    installment_id: paid.id.clone(),
                    sale_id: None,
                },
                entry(1, on(2026, 2, 21)),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::ExceedsBalance { .. })
        ));

        let rows = db.installments().list_by_sale(&sale.id).await.unwrap();
        assert_eq!(rows[0].amount_paid_cents, 1_000_000);
        assert_eq!(rows[0].status, InstallmentStatus::Pagado);
    }

    #[tokio::test]
    async fn test_wrong_sale_association_rejected() {
        let db = test_db().await;
        let sale = financed_sale(&db, 12).await;
        let other_sale = financed_sale(&db, 12).await;
        let ledger = PaymentLedger::new(db.clone(), LedgerPolicy::default());

        let rows = db.installments().list_by_sale(&sale.id).await.unwrap();

        let err = ledger
            .apply_payment(
                PaymentTarget::Installment {
                    installment_id: rows[0].id.clone(),
                    sale_id: Some(other_sale.id.clone()),
                },
                entry(100, on(2026, 2, 20)),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InvalidAssociation { .. })
        ));
    }

    #[tokio::test]
    async fn test_liquidation_after_last_installment() {
        let db = test_db().await;
        let sale = financed_sale(&db, 3).await; // 3 x 4,000,000
        let ledger = PaymentLedger::new(db.clone(), LedgerPolicy::default());

        for _ in 0..3 {
            ledger
                .apply_payment(
                    PaymentTarget::OldestUnpaid {
                        sale_id: sale.id.clone(),
                    },
                    entry(4_000_000, on(2026, 2, 20)),
                )
                .await
                .unwrap();
        }

        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SaleStatus::Liquidado);

        let lot = db.lots().get_by_id(&sale.lot_id).await.unwrap().unwrap();
        assert_eq!(lot.status, predio_core::LotStatus::Sold);

        // nothing left to pay
        let err = ledger
            .apply_payment(
                PaymentTarget::OldestUnpaid {
                    sale_id: sale.id.clone(),
                },
                entry(100, on(2026, 2, 21)),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::NoPendingInstallments(_))
        ));
    }

    #[tokio::test]
    async fn test_notes_are_appended() {
        let db = test_db().await;
        let sale = financed_sale(&db, 12).await;
        let ledger = PaymentLedger::new(db.clone(), LedgerPolicy::default());

        let target = PaymentTarget::SaleInstallment {
            sale_id: sale.id.clone(),
            number: 1,
        };

        ledger
            .apply_payment(
                target.clone(),
                PaymentEntry {
                    amount: Money::from_cents(100_000),
                    paid_on: on(2026, 2, 20),
                    notes: Some("abono en efectivo".to_string()),
                },
            )
            .await
            .unwrap();

        let second = ledger
            .apply_payment(
                target,
                PaymentEntry {
                    amount: Money::from_cents(100_000),
                    paid_on: on(2026, 2, 21),
                    notes: Some("transferencia".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            second.notes.as_deref(),
            Some("abono en efectivo\ntransferencia")
        );
    }

    #[tokio::test]
    async fn test_zero_amount_rejected_before_transaction() {
        let db = test_db().await;
        let sale = financed_sale(&db, 12).await;
        let ledger = PaymentLedger::new(db.clone(), LedgerPolicy::default());

        let err = ledger
            .apply_payment(
                PaymentTarget::OldestUnpaid {
                    sale_id: sale.id.clone(),
                },
                entry(0, on(2026, 2, 20)),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InvalidAmount { .. })
        ));
    }
}
