//! # predio-api: HTTP Surface for the Predio CRM
//!
//! Thin orchestration layer: handlers validate input, call one service and
//! shape the response. Business rules live in predio-core, transaction
//! boundaries in predio-db.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /ventas ──► validate ──► SaleOriginator ──► 201 {data: Sale}      │
//! │                                                                         │
//! │  GET /ventas ──► rate limit ──► cache ──► SaleRepository ──► 200       │
//! │                                                                         │
//! │  POST /pagos ──► validate ──► PaymentLedger ──► 200 {data: Pago}        │
//! │                                                                         │
//! │  POST /pagos/webhooks/stripe                                            │
//! │        ──► verify signature (400 on failure, nothing recorded)          │
//! │        ──► WebhookReconciler (idempotent) ──► 200 ack / 500 retry       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod stripe;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use predio_db::{Database, PaymentLedger, SaleOriginator, WebhookReconciler};

use crate::cache::ReadCache;
use crate::config::ApiConfig;
use crate::rate_limit::RateLimiter;
use crate::stripe::StripeClient;

// Re-exports
pub use config::ConfigError;
pub use error::{ApiError, ErrorCode};

/// Shared application state, one per server instance.
///
/// Everything here is either cheaply cloneable (pool-backed services) or
/// behind an Arc (cache, limiter), so handlers clone freely.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub originator: SaleOriginator,
    pub ledger: PaymentLedger,
    pub reconciler: WebhookReconciler,
    pub stripe: StripeClient,
    pub cache: Arc<ReadCache>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wires the services, cache and limiter from a database handle and
    /// configuration.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let originator = SaleOriginator::new(db.clone(), config.commission_policy());
        let ledger = PaymentLedger::new(db.clone(), config.ledger_policy());
        let reconciler = WebhookReconciler::new(db.clone(), config.ledger_policy());
        let stripe = StripeClient::new(config.stripe_webhook_secret.clone());
        let cache = Arc::new(ReadCache::new(Duration::from_secs(config.cache_ttl_secs)));
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_max,
            Duration::from_secs(config.rate_limit_window_secs),
        ));

        AppState {
            db,
            config: Arc::new(config),
            originator,
            ledger,
            reconciler,
            stripe,
            cache,
            limiter,
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    routes::router(state)
}
