//! # Processed Event Repository
//!
//! The webhook idempotency log.
//!
//! ## Why insert-if-absent, not check-then-act
//! Two concurrent deliveries of the same event could both pass a SELECT
//! existence check before either inserts. `INSERT OR IGNORE` against the
//! primary key inside the mutation transaction collapses the check and the
//! claim into one statement: exactly one delivery observes
//! `rows_affected == 1` and proceeds to side effects.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use predio_core::ProcessedEvent;

/// Repository for the idempotency log.
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    /// Creates a new EventRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EventRepository { pool }
    }

    /// Claims an event id. Returns `false` when the event was already
    /// processed (or claimed by a concurrent delivery).
    pub async fn insert_if_absent(
        &self,
        conn: &mut SqliteConnection,
        event_id: &str,
        processed_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO processed_events (event_id, processed_at) VALUES (?1, ?2)",
        )
        .bind(event_id)
        .bind(processed_at)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Looks up a processed event (diagnostics).
    pub async fn get(&self, event_id: &str) -> DbResult<Option<ProcessedEvent>> {
        let event = sqlx::query_as::<_, ProcessedEvent>(
            "SELECT event_id, processed_at FROM processed_events WHERE event_id = ?1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }
}
