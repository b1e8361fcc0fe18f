//! # Pago Handlers
//!
//! Manual payments, payment-intent issuance, the processor webhook and the
//! limited PATCH surface.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use predio_core::validation::validate_payment_amount;
use predio_core::{CoreError, Money};
use predio_db::{PaymentEntry, PaymentTarget, ProcessorEvent};

use crate::error::ApiError;
use crate::stripe::{new_client_secret, new_payment_intent_id};
use crate::AppState;

// =============================================================================
// POST /pagos
// =============================================================================

/// `POST /pagos` request body. The target is one of:
/// - `pagoId` (optionally with `ventaId` as a cross-check)
/// - `ventaId` + `numeroPago`
/// - `ventaId` alone → oldest unpaid installment
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPagoRequest {
    #[serde(default)]
    pub pago_id: Option<String>,
    #[serde(default)]
    pub venta_id: Option<String>,
    #[serde(default)]
    pub numero_pago: Option<i64>,
    pub monto: f64,
    #[serde(default)]
    pub fecha_pago: Option<NaiveDate>,
    #[serde(default)]
    pub notas: Option<String>,
}

/// `POST /pagos` — applies a manual payment through the ledger.
pub async fn apply_pago(
    State(state): State<AppState>,
    Json(body): Json<ApplyPagoRequest>,
) -> Result<Json<Value>, ApiError> {
    validate_payment_amount("monto", body.monto)?;

    let target = match (body.pago_id, body.venta_id) {
        (Some(pago_id), venta_id) => PaymentTarget::Installment {
            installment_id: pago_id,
            sale_id: venta_id,
        },
        (None, Some(venta_id)) => match body.numero_pago {
            Some(number) => PaymentTarget::SaleInstallment {
                sale_id: venta_id,
                number,
            },
            None => PaymentTarget::OldestUnpaid { sale_id: venta_id },
        },
        (None, None) => {
            return Err(ApiError::validation("either pagoId or ventaId is required"));
        }
    };

    let entry = PaymentEntry {
        amount: Money::from_f64(body.monto),
        paid_on: body.fecha_pago.unwrap_or_else(|| Utc::now().date_naive()),
        notes: body.notas,
    };

    let installment = state.ledger.apply_payment(target, entry).await?;
    state.cache.clear();

    Ok(Json(json!({ "data": installment })))
}

// =============================================================================
// POST /pagos/create-payment-intent
// =============================================================================

/// `POST /pagos/create-payment-intent` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    pub venta_id: String,
    pub numero_pago: i64,
    pub cliente_id: String,
}

/// `POST /pagos/create-payment-intent` — issues the identifiers the front
/// end hands to the processor and records the association on the
/// installment, so the webhook can resolve it later. The processor
/// round-trip itself belongs to the platform.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(body): Json<CreateIntentRequest>,
) -> Result<Json<Value>, ApiError> {
    debug!(venta_id = %body.venta_id, numero = body.numero_pago, "create_payment_intent");

    let sale = state
        .db
        .sales()
        .get_by_id(&body.venta_id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::SaleNotFound(body.venta_id.clone())))?;

    // The paying client must own the sale.
    if sale.client_id != body.cliente_id {
        return Err(ApiError::validation(format!(
            "venta {} does not belong to cliente {}",
            sale.id, body.cliente_id
        )));
    }

    let installment = state
        .db
        .installments()
        .list_by_sale(&sale.id)
        .await?
        .into_iter()
        .find(|i| i.installment_number == body.numero_pago)
        .ok_or_else(|| {
            ApiError::from(CoreError::InstallmentNotFound(format!(
                "{}#{}",
                sale.id, body.numero_pago
            )))
        })?;

    if installment.is_settled() {
        return Err(ApiError::new(
            crate::ErrorCode::Conflict,
            format!("pago {} is already pagado", installment.id),
        ));
    }

    let payment_intent_id = new_payment_intent_id();
    let client_secret = new_client_secret(&payment_intent_id);

    state
        .db
        .installments()
        .set_payment_intent(&installment.id, &payment_intent_id)
        .await?;

    info!(
        installment_id = %installment.id,
        payment_intent_id = %payment_intent_id,
        "Payment intent issued"
    );

    Ok(Json(json!({
        "clientSecret": client_secret,
        "paymentIntentId": payment_intent_id,
    })))
}

// =============================================================================
// POST /pagos/webhooks/stripe
// =============================================================================

/// `POST /pagos/webhooks/stripe` — verified, idempotent processor callback.
///
/// Status contract with the processor:
/// - 400: bad/missing signature or unparseable payload; never retried,
///   never mutates state
/// - 200: acknowledged (applied, duplicate, or unhandled kind)
/// - 500: internal failure after verification; the processor retries and
///   the idempotency log makes the retry safe
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::validation("missing Stripe-Signature header"))?;

    let valid = state
        .stripe
        .verify_webhook_signature(&body, signature)
        .map_err(|e| ApiError::validation(e.to_string()))?;
    if !valid {
        return Err(ApiError::validation("invalid webhook signature"));
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::validation(format!("malformed webhook payload: {e}")))?;
    let event = ProcessorEvent::from_payload(&payload).map_err(ApiError::from)?;

    let outcome = state
        .reconciler
        .handle(event, Utc::now().date_naive())
        .await
        .map_err(|err| {
            // Post-verification failures must surface as 500 so the
            // processor redelivers; the idempotency log absorbs the retry.
            error!(error = %err, "Webhook reconciliation failed");
            ApiError::internal()
        })?;

    state.cache.clear();
    debug!(outcome = ?outcome, "Webhook processed");

    Ok(Json(json!({ "received": true })))
}

// =============================================================================
// PATCH /pagos/:id
// =============================================================================

/// `PATCH /pagos/:id` request body — the full allow-list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchPagoRequest {
    #[serde(default)]
    pub monto: Option<f64>,
    #[serde(default)]
    pub notas: Option<String>,
}

/// `PATCH /pagos/:id` — limited edits (`monto`, `notas`); forbidden once
/// the installment is pagado.
pub async fn patch_pago(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PatchPagoRequest>,
) -> Result<Json<Value>, ApiError> {
    let installment = state
        .db
        .installments()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::InstallmentNotFound(id.clone())))?;

    if installment.is_settled() {
        return Err(ApiError::from(CoreError::InstallmentClosed(id)));
    }

    let amount_due_cents = match body.monto {
        Some(monto) => {
            validate_payment_amount("monto", monto)?;
            let cents = Money::from_f64(monto).cents();
            if cents < installment.amount_paid_cents {
                return Err(ApiError::validation(format!(
                    "monto {} is below the amount already paid {}",
                    Money::from_cents(cents),
                    Money::from_cents(installment.amount_paid_cents)
                )));
            }
            Some(cents)
        }
        None => None,
    };

    if amount_due_cents.is_none() && body.notas.is_none() {
        return Err(ApiError::validation(
            "nothing to update: allowed fields are monto, notas",
        ));
    }

    state
        .db
        .installments()
        .update_allowlist(&installment.id, amount_due_cents, body.notas.as_deref())
        .await?;

    let updated = state
        .db
        .installments()
        .get_by_id(&installment.id)
        .await?
        .ok_or_else(|| ApiError::internal())?;

    state.cache.clear();

    Ok(Json(json!({ "data": updated })))
}
