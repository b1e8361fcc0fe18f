//! # Seller Repository
//!
//! Sellers carry the commission scheme the scheduler consumes at
//! origination time.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use predio_core::{CommissionScheme, Seller};

/// Repository for seller records.
#[derive(Debug, Clone)]
pub struct SellerRepository {
    pool: SqlitePool,
}

impl SellerRepository {
    /// Creates a new SellerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SellerRepository { pool }
    }

    /// Gets a seller by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Seller>> {
        let seller = sqlx::query_as::<_, Seller>(
            r#"
            SELECT id, name, commission_scheme, commission_rate_bps,
                   fixed_commission_cents, created_at
            FROM sellers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(seller)
    }

    /// Gets a seller by ID inside an open transaction.
    pub async fn get_by_id_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Seller>> {
        let seller = sqlx::query_as::<_, Seller>(
            r#"
            SELECT id, name, commission_scheme, commission_rate_bps,
                   fixed_commission_cents, created_at
            FROM sellers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(seller)
    }

    /// Inserts a seller (seeding/admin tooling).
    pub async fn insert(&self, seller: &Seller) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sellers (
                id, name, commission_scheme, commission_rate_bps,
                fixed_commission_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&seller.id)
        .bind(&seller.name)
        .bind(seller.commission_scheme)
        .bind(seller.commission_rate_bps)
        .bind(seller.fixed_commission_cents)
        .bind(seller.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Convenience constructor for a seller record.
    pub fn build(
        name: &str,
        scheme: CommissionScheme,
        rate_bps: Option<i64>,
        fixed_cents: i64,
    ) -> Seller {
        Seller {
            id: super::new_id(),
            name: name.to_string(),
            commission_scheme: scheme,
            commission_rate_bps: rate_bps,
            fixed_commission_cents: fixed_cents,
            created_at: Utc::now(),
        }
    }
}
