//! # Client Repository
//!
//! Clients are platform-managed; the engine reads them during origination
//! and writes them only from seeding/administrative tooling.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use predio_core::Client;

/// Repository for client records.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Gets a client by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            "SELECT id, name, email, created_at FROM clients WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// Gets a client by ID inside an open transaction.
    pub async fn get_by_id_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            "SELECT id, name, email, created_at FROM clients WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(client)
    }

    /// Inserts a client (seeding/admin tooling).
    pub async fn insert(&self, client: &Client) -> DbResult<()> {
        sqlx::query("INSERT INTO clients (id, name, email, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&client.id)
            .bind(&client.name)
            .bind(&client.email)
            .bind(client.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Convenience constructor for a client record.
    pub fn build(name: &str, email: Option<&str>) -> Client {
        Client {
            id: super::new_id(),
            name: name.to_string(),
            email: email.map(|e| e.to_string()),
            created_at: Utc::now(),
        }
    }
}
