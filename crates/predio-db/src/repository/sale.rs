//! # Sale Repository
//!
//! Database operations for sales.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. ORIGINATE (service::originator, one transaction)                   │
//! │     └── insert() → Sale { status: Apartado }                           │
//! │     └── installments + commissions bulk-inserted alongside             │
//! │     └── set_post_process_status(Ok)                                    │
//! │                                                                         │
//! │  2. COLLECT (service::ledger)                                          │
//! │     └── payments accumulate on installments                            │
//! │                                                                         │
//! │  3. LIQUIDATE                                                          │
//! │     └── mark_liquidated() once no unpaid installment remains           │
//! │         (conditional UPDATE — flips exactly once)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use predio_core::{PostProcessStatus, Sale};

/// Typed filter for the sale listing query, replacing ad hoc JSON filter
/// shapes with an explicit struct the query builder consumes.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub client_id: Option<String>,
    pub seller_id: Option<String>,
    /// Inclusive lower bound on `sale_date`.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on `sale_date`.
    pub to: Option<NaiveDate>,
    /// 1-based page.
    pub page: u32,
    pub limit: u32,
}

impl SaleFilter {
    /// Effective LIMIT, clamped to a sane window.
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, 200) as i64
    }

    /// Effective OFFSET from the 1-based page.
    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.limit()
    }
}

/// Repository for sale records.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

const SALE_COLUMNS: &str = "id, client_id, lot_id, seller_id, total_cents, down_payment_cents, \
     term_months, annual_rate_bps, sale_date, status, post_process_status, \
     created_at, updated_at";

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale by ID inside an open transaction.
    pub async fn get_by_id_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(sale)
    }

    /// Inserts a sale inside the origination transaction.
    pub async fn insert(&self, conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, lot_id = %sale.lot_id, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, client_id, lot_id, seller_id,
                total_cents, down_payment_cents, term_months, annual_rate_bps,
                sale_date, status, post_process_status,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.client_id)
        .bind(&sale.lot_id)
        .bind(&sale.seller_id)
        .bind(sale.total_cents)
        .bind(sale.down_payment_cents)
        .bind(sale.term_months)
        .bind(sale.annual_rate_bps)
        .bind(sale.sale_date)
        .bind(sale.status)
        .bind(sale.post_process_status)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Lists sales matching the filter, newest first.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {SALE_COLUMNS} FROM sales WHERE 1=1"));

        if let Some(client_id) = &filter.client_id {
            qb.push(" AND client_id = ").push_bind(client_id);
        }
        if let Some(seller_id) = &filter.seller_id {
            qb.push(" AND seller_id = ").push_bind(seller_id);
        }
        if let Some(from) = filter.from {
            qb.push(" AND sale_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND sale_date <= ").push_bind(to);
        }

        qb.push(" ORDER BY sale_date DESC, created_at DESC");
        qb.push(" LIMIT ").push_bind(filter.limit());
        qb.push(" OFFSET ").push_bind(filter.offset());

        let sales = qb.build_query_as::<Sale>().fetch_all(&self.pool).await?;
        Ok(sales)
    }

    /// Updates the schedule/commission generation marker.
    ///
    /// Also the entry point for the asynchronous repair tooling that
    /// re-drives generation after an `error` marker.
    pub async fn set_post_process_status(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        status: PostProcessStatus,
    ) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query("UPDATE sales SET post_process_status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(now)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Marks a sale liquidated, once.
    ///
    /// The `status != 'liquidado'` guard makes the transition idempotent:
    /// only the payment that settled the last installment observes
    /// `rows_affected == 1`.
    pub async fn mark_liquidated(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE sales SET status = 'liquidado', updated_at = ?2 \
             WHERE id = ?1 AND status != 'liquidado'",
        )
        .bind(id)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
