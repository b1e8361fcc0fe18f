//! # Routes
//!
//! The HTTP surface consumed by the front end and the payment processor.

pub mod pagos;
pub mod ventas;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::AppState;

/// Assembles the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/ventas",
            post(ventas::create_venta).get(ventas::list_ventas),
        )
        .route("/pagos", post(pagos::apply_pago))
        .route(
            "/pagos/create-payment-intent",
            post(pagos::create_payment_intent),
        )
        .route("/pagos/webhooks/stripe", post(pagos::stripe_webhook))
        .route("/pagos/:id", patch(pagos::patch_pago))
        .route("/health", get(health))
        .with_state(state)
}

/// Liveness probe.
async fn health() -> &'static str {
    "ok"
}
