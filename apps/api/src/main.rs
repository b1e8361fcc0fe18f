//! Predio CRM API server entry point.
//!
//! ## Configuration
//! Environment variables (all optional in development):
//! - `HTTP_PORT` - listen port (default: 8080)
//! - `DATABASE_PATH` - SQLite file (default: ./predio.db)
//! - `STRIPE_WEBHOOK_SECRET` - webhook signing secret
//! - `LATE_FEE_BPS` - late fee in bps of the installment (default: 500)
//! - `COMMISSION_RATE_BPS` - default seller rate (default: 500)
//! - `COMMISSION_SPLIT_BPS` - milestone split (default: 3000,3000,4000)
//! - `CACHE_TTL_SECS` / `RATE_LIMIT_MAX` / `RATE_LIMIT_WINDOW_SECS`
//! - `RUST_LOG` - tracing filter (default: info)

use tracing::info;
use tracing_subscriber::EnvFilter;

use predio_api::config::ApiConfig;
use predio_api::{router, AppState};
use predio_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ApiConfig::load()?;
    info!(port = config.http_port, db = %config.database_path, "Starting predio-api");

    let db = Database::new(DbConfig::new(&config.database_path)).await?;

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Listening");

    let app = router(AppState::new(db, config));
    axum::serve(listener, app).await?;

    Ok(())
}
