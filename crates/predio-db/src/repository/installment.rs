//! # Installment Repository
//!
//! Database operations for amortization rows. Bulk-created at origination,
//! then mutated exclusively by the payment ledger.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use predio_core::amortization::ScheduleRow;
use predio_core::{Installment, InstallmentStatus};

/// Repository for installment records.
#[derive(Debug, Clone)]
pub struct InstallmentRepository {
    pool: SqlitePool,
}

const INSTALLMENT_COLUMNS: &str = "id, sale_id, installment_number, due_date, amount_due_cents, \
     interest_cents, principal_cents, opening_balance_cents, closing_balance_cents, \
     amount_paid_cents, late_fee_cents, status, notes, payment_intent_id, \
     created_at, updated_at";

impl InstallmentRepository {
    /// Creates a new InstallmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InstallmentRepository { pool }
    }

    /// Bulk-inserts a freshly generated schedule inside the origination
    /// transaction.
    ///
    /// All-or-nothing: the surrounding transaction rolls back on any
    /// failure, so a sale never ends up with a partial schedule.
    pub async fn insert_schedule(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        rows: &[ScheduleRow],
    ) -> DbResult<Vec<Installment>> {
        debug!(sale_id = %sale_id, rows = rows.len(), "Inserting amortization schedule");

        let now = Utc::now();
        let mut installments = Vec::with_capacity(rows.len());

        for row in rows {
            let installment = Installment {
                id: super::new_id(),
                sale_id: sale_id.to_string(),
                installment_number: row.number as i64,
                due_date: row.due_date,
                amount_due_cents: row.amount_due.cents(),
                interest_cents: row.interest.cents(),
                principal_cents: row.principal.cents(),
                opening_balance_cents: row.opening_balance.cents(),
                closing_balance_cents: row.closing_balance.cents(),
                amount_paid_cents: 0,
                late_fee_cents: 0,
                status: InstallmentStatus::Pendiente,
                notes: None,
                payment_intent_id: None,
                created_at: now,
                updated_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO installments (
                    id, sale_id, installment_number, due_date,
                    amount_due_cents, interest_cents, principal_cents,
                    opening_balance_cents, closing_balance_cents,
                    amount_paid_cents, late_fee_cents, status,
                    notes, payment_intent_id, created_at, updated_at
                ) VALUES (
                    ?1, ?2, ?3, ?4,
                    ?5, ?6, ?7,
                    ?8, ?9,
                    ?10, ?11, ?12,
                    ?13, ?14, ?15, ?16
                )
                "#,
            )
            .bind(&installment.id)
            .bind(&installment.sale_id)
            .bind(installment.installment_number)
            .bind(installment.due_date)
            .bind(installment.amount_due_cents)
            .bind(installment.interest_cents)
            .bind(installment.principal_cents)
            .bind(installment.opening_balance_cents)
            .bind(installment.closing_balance_cents)
            .bind(installment.amount_paid_cents)
            .bind(installment.late_fee_cents)
            .bind(installment.status)
            .bind(&installment.notes)
            .bind(&installment.payment_intent_id)
            .bind(installment.created_at)
            .bind(installment.updated_at)
            .execute(&mut *conn)
            .await?;

            installments.push(installment);
        }

        Ok(installments)
    }

    /// Gets an installment by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Installment>> {
        let installment = sqlx::query_as::<_, Installment>(&format!(
            "SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(installment)
    }

    /// Gets an installment by ID inside an open transaction.
    pub async fn get_by_id_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Installment>> {
        let installment = sqlx::query_as::<_, Installment>(&format!(
            "SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(installment)
    }

    /// Gets an installment by (sale, number) inside an open transaction.
    pub async fn get_by_sale_and_number_tx(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        number: i64,
    ) -> DbResult<Option<Installment>> {
        let installment = sqlx::query_as::<_, Installment>(&format!(
            "SELECT {INSTALLMENT_COLUMNS} FROM installments \
             WHERE sale_id = ?1 AND installment_number = ?2"
        ))
        .bind(sale_id)
        .bind(number)
        .fetch_optional(conn)
        .await?;

        Ok(installment)
    }

    /// Oldest unpaid installment for a sale (lowest number not yet
    /// `pagado`), the default payment target.
    pub async fn oldest_unpaid_tx(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<Option<Installment>> {
        let installment = sqlx::query_as::<_, Installment>(&format!(
            "SELECT {INSTALLMENT_COLUMNS} FROM installments \
             WHERE sale_id = ?1 AND status != 'pagado' \
             ORDER BY installment_number ASC LIMIT 1"
        ))
        .bind(sale_id)
        .fetch_optional(conn)
        .await?;

        Ok(installment)
    }

    /// Resolves an installment from the processor's payment-intent id.
    pub async fn get_by_payment_intent_tx(
        &self,
        conn: &mut SqliteConnection,
        payment_intent_id: &str,
    ) -> DbResult<Option<Installment>> {
        let installment = sqlx::query_as::<_, Installment>(&format!(
            "SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE payment_intent_id = ?1"
        ))
        .bind(payment_intent_id)
        .fetch_optional(conn)
        .await?;

        Ok(installment)
    }

    /// Lists all installments for a sale, in schedule order.
    pub async fn list_by_sale(&self, sale_id: &str) -> DbResult<Vec<Installment>> {
        let installments = sqlx::query_as::<_, Installment>(&format!(
            "SELECT {INSTALLMENT_COLUMNS} FROM installments \
             WHERE sale_id = ?1 ORDER BY installment_number ASC"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(installments)
    }

    /// Persists the ledger's bookkeeping after a payment: paid amount,
    /// late fee, status and notes move together or not at all.
    pub async fn record_payment(
        &self,
        conn: &mut SqliteConnection,
        installment: &Installment,
    ) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE installments SET
                amount_paid_cents = ?2,
                late_fee_cents = ?3,
                status = ?4,
                notes = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&installment.id)
        .bind(installment.amount_paid_cents)
        .bind(installment.late_fee_cents)
        .bind(installment.status)
        .bind(&installment.notes)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Appends a note (newline-joined) without touching amounts or status.
    /// Used for processor `payment-failed` events.
    pub async fn append_note_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        note: &str,
    ) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE installments SET
                notes = CASE
                    WHEN notes IS NULL OR notes = '' THEN ?2
                    ELSE notes || char(10) || ?2
                END,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(note)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Associates a processor payment intent with an installment.
    pub async fn set_payment_intent(&self, id: &str, payment_intent_id: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            "UPDATE installments SET payment_intent_id = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(payment_intent_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Applies the PATCH allow-list: `amount_due` and/or `notes` only.
    pub async fn update_allowlist(
        &self,
        id: &str,
        amount_due_cents: Option<i64>,
        notes: Option<&str>,
    ) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE installments SET
                amount_due_cents = COALESCE(?2, amount_due_cents),
                notes = COALESCE(?3, notes),
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(amount_due_cents)
        .bind(notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of installments not yet fully paid for a sale. Zero means the
    /// sale is liquidatable.
    pub async fn unsettled_count_tx(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM installments WHERE sale_id = ?1 AND status != 'pagado'",
        )
        .bind(sale_id)
        .fetch_one(conn)
        .await?;

        Ok(count)
    }
}
