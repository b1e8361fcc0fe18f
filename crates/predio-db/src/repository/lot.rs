//! # Lot Repository
//!
//! ## Concurrency
//! Two sales can race for one lot. The winner is decided by
//! [`LotRepository::claim_available`]: a conditional UPDATE that only
//! matches rows still in `available`. Exactly one transaction observes
//! `rows_affected == 1`; the loser sees 0 and surfaces `LoteNotAvailable`.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use predio_core::{Lot, LotStatus};

/// Repository for lot records.
#[derive(Debug, Clone)]
pub struct LotRepository {
    pool: SqlitePool,
}

impl LotRepository {
    /// Creates a new LotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LotRepository { pool }
    }

    /// Gets a lot by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Lot>> {
        let lot = sqlx::query_as::<_, Lot>(
            "SELECT id, name, status, list_price_cents, created_at, updated_at \
             FROM lots WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lot)
    }

    /// Gets a lot by ID inside an open transaction.
    pub async fn get_by_id_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Lot>> {
        let lot = sqlx::query_as::<_, Lot>(
            "SELECT id, name, status, list_price_cents, created_at, updated_at \
             FROM lots WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(lot)
    }

    /// Atomically claims an available lot, moving it to `target`.
    ///
    /// Returns `false` when the lot was no longer `available` — the caller
    /// lost the race (or the lot was reserved/sold all along) and must roll
    /// back.
    pub async fn claim_available(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        target: LotStatus,
    ) -> DbResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE lots SET status = ?2, updated_at = ?3 \
             WHERE id = ?1 AND status = 'available'",
        )
        .bind(id)
        .bind(target)
        .bind(now)
        .execute(conn)
        .await?;

        let claimed = result.rows_affected() == 1;
        debug!(lot_id = %id, target = target.as_str(), claimed, "Lot claim attempt");
        Ok(claimed)
    }

    /// Sets a lot's status unconditionally (liquidation marks the lot sold).
    pub async fn set_status(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        status: LotStatus,
    ) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query("UPDATE lots SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(now)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Inserts a lot (seeding/admin tooling).
    pub async fn insert(&self, lot: &Lot) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO lots (id, name, status, list_price_cents, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&lot.id)
        .bind(&lot.name)
        .bind(lot.status)
        .bind(lot.list_price_cents)
        .bind(lot.created_at)
        .bind(lot.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Convenience constructor for an available lot.
    pub fn build(name: &str, list_price_cents: i64) -> Lot {
        let now = Utc::now();
        Lot {
            id: super::new_id(),
            name: name.to_string(),
            status: LotStatus::Available,
            list_price_cents,
            created_at: now,
            updated_at: now,
        }
    }
}
