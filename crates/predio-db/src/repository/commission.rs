//! # Commission Repository
//!
//! Commissions are bulk-created during origination and read-only afterwards
//! in this engine (payout runs through back-office tooling).

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use predio_core::commission::CommissionDraft;
use predio_core::{Commission, CommissionStatus};

/// Repository for commission records.
#[derive(Debug, Clone)]
pub struct CommissionRepository {
    pool: SqlitePool,
}

impl CommissionRepository {
    /// Creates a new CommissionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CommissionRepository { pool }
    }

    /// Bulk-inserts scheduled commissions inside the origination
    /// transaction.
    pub async fn insert_drafts(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        seller_id: &str,
        drafts: &[CommissionDraft],
    ) -> DbResult<Vec<Commission>> {
        debug!(sale_id = %sale_id, records = drafts.len(), "Inserting commission schedule");

        let now = Utc::now();
        let mut commissions = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let commission = Commission {
                id: super::new_id(),
                sale_id: sale_id.to_string(),
                seller_id: seller_id.to_string(),
                kind: draft.kind,
                sale_amount_cents: draft.sale_amount.cents(),
                commission_cents: draft.commission.cents(),
                rate_bps: draft.rate_bps as i64,
                status: CommissionStatus::Pendiente,
                scheduled_payment_date: draft.scheduled_payment_date,
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO commissions (
                    id, sale_id, seller_id, kind,
                    sale_amount_cents, commission_cents, rate_bps,
                    status, scheduled_payment_date, created_at
                ) VALUES (
                    ?1, ?2, ?3, ?4,
                    ?5, ?6, ?7,
                    ?8, ?9, ?10
                )
                "#,
            )
            .bind(&commission.id)
            .bind(&commission.sale_id)
            .bind(&commission.seller_id)
            .bind(commission.kind)
            .bind(commission.sale_amount_cents)
            .bind(commission.commission_cents)
            .bind(commission.rate_bps)
            .bind(commission.status)
            .bind(commission.scheduled_payment_date)
            .bind(commission.created_at)
            .execute(&mut *conn)
            .await?;

            commissions.push(commission);
        }

        Ok(commissions)
    }

    /// Lists all commissions for a sale.
    pub async fn list_by_sale(&self, sale_id: &str) -> DbResult<Vec<Commission>> {
        let commissions = sqlx::query_as::<_, Commission>(
            r#"
            SELECT id, sale_id, seller_id, kind,
                   sale_amount_cents, commission_cents, rate_bps,
                   status, scheduled_payment_date, created_at
            FROM commissions
            WHERE sale_id = ?1
            ORDER BY created_at, kind
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(commissions)
    }
}
