//! Seeds a development database with demo clients, sellers and lots.
//!
//! ## Usage
//! ```text
//! DATABASE_PATH=./predio.db cargo run -p predio-db --bin seed
//! ```

use std::env;

use predio_core::CommissionScheme;
use predio_db::{ClientRepository, Database, DbConfig, LotRepository, SellerRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_init();

    let path = env::var("DATABASE_PATH").unwrap_or_else(|_| "./predio.db".to_string());
    let db = Database::new(DbConfig::new(&path)).await?;

    let clients = [
        ClientRepository::build("María Torres", Some("maria.torres@example.com")),
        ClientRepository::build("José Hernández", Some("jose.hernandez@example.com")),
        ClientRepository::build("Lucía Rangel", None),
    ];
    for client in &clients {
        db.clients().insert(client).await?;
        println!("client  {}  {}", client.id, client.name);
    }

    let sellers = [
        SellerRepository::build("Ana Cardoso", CommissionScheme::Porcentaje, Some(500), 0),
        SellerRepository::build("Pedro Lima", CommissionScheme::Fijo, None, 500_000),
        SellerRepository::build("Rosa Méndez", CommissionScheme::Mixto, Some(400), 250_000),
    ];
    for seller in &sellers {
        db.sellers().insert(seller).await?;
        println!("seller  {}  {}", seller.id, seller.name);
    }

    for (name, price_cents) in [
        ("Manzana 1 Lote 01", 15_000_000),
        ("Manzana 1 Lote 02", 15_000_000),
        ("Manzana 2 Lote 07", 22_500_000),
        ("Manzana 3 Lote 14", 18_750_000),
    ] {
        let lot = LotRepository::build(name, price_cents);
        db.lots().insert(&lot).await?;
        println!("lot     {}  {}", lot.id, lot.name);
    }

    println!("seeded {}", path);
    Ok(())
}

fn tracing_init() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}
