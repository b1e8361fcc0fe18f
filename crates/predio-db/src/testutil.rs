//! Shared helpers for the service-layer tests: an isolated in-memory
//! database plus seeded collaborator records.

use crate::pool::{Database, DbConfig};
use crate::repository::client::ClientRepository;
use crate::repository::lot::LotRepository;
use crate::repository::seller::SellerRepository;
use predio_core::{Client, CommissionScheme, Lot, Seller};

/// Fresh in-memory database with all migrations applied.
pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

pub async fn seed_client(db: &Database) -> Client {
    let client = ClientRepository::build("Cliente Prueba", Some("cliente@example.com"));
    db.clients().insert(&client).await.expect("insert client");
    client
}

pub async fn seed_lot(db: &Database, list_price_cents: i64) -> Lot {
    let lot = LotRepository::build("Manzana 1 Lote 1", list_price_cents);
    db.lots().insert(&lot).await.expect("insert lot");
    lot
}

pub async fn seed_seller(
    db: &Database,
    scheme: CommissionScheme,
    rate_bps: Option<i64>,
    fixed_cents: i64,
) -> Seller {
    let seller = SellerRepository::build("Vendedor Prueba", scheme, rate_bps, fixed_cents);
    db.sellers().insert(&seller).await.expect("insert seller");
    seller
}
