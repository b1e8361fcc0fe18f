//! # Venta Handlers
//!
//! Sale creation (write path) and the cached, rate-limited listing (read
//! path).

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use predio_core::validation::{
    validate_amount, validate_annual_rate, validate_id, validate_term_months,
};
use predio_core::{InterestRate, Money};
use predio_db::{NewSale, SaleFilter};

use crate::error::ApiError;
use crate::AppState;

/// `POST /ventas` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVentaRequest {
    pub cliente_id: String,
    pub lote_id: String,
    #[serde(default)]
    pub vendedor_id: Option<String>,
    pub monto_enganche: f64,
    pub plazo_meses: i64,
    pub tasa_interes: f64,
}

/// `POST /ventas` — originates a sale with its schedules, atomically.
pub async fn create_venta(
    State(state): State<AppState>,
    Json(body): Json<CreateVentaRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    debug!(cliente_id = %body.cliente_id, lote_id = %body.lote_id, "create_venta");

    // Validation before the transaction opens.
    validate_id("clienteId", &body.cliente_id)?;
    validate_id("loteId", &body.lote_id)?;
    validate_amount("montoEnganche", body.monto_enganche)?;
    validate_term_months(body.plazo_meses)?;
    validate_annual_rate(body.tasa_interes)?;

    let sale = state
        .originator
        .create_sale(NewSale {
            client_id: body.cliente_id,
            lot_id: body.lote_id,
            seller_id: body.vendedor_id.filter(|id| !id.trim().is_empty()),
            down_payment: Money::from_f64(body.monto_enganche),
            term_months: body.plazo_meses as u32,
            annual_rate: InterestRate::from_percentage(body.tasa_interes),
            sale_date: Utc::now().date_naive(),
        })
        .await?;

    // The listing cache is stale now; drop it rather than serve a deleted
    // world for a whole TTL.
    state.cache.clear();

    Ok((StatusCode::CREATED, Json(json!({ "data": sale }))))
}

/// `GET /ventas` query parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VentasQuery {
    pub cliente_id: Option<String>,
    pub vendedor_id: Option<String>,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// `GET /ventas` — filtered listing, rate-limited and served from the
/// short-TTL cache when possible.
pub async fn list_ventas(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<VentasQuery>,
) -> Result<Json<Value>, ApiError> {
    // The limiter runs before any repository work.
    let caller = client_key(&headers);
    if !state.limiter.check(&caller) {
        return Err(ApiError::rate_limited());
    }

    // Own-records capability: the platform injects the caller's scope; it
    // overrides whatever clienteId the query asked for.
    let client_id = match headers.get("x-cliente-scope").and_then(|v| v.to_str().ok()) {
        Some(scope) => Some(scope.to_string()),
        None => query.cliente_id.clone(),
    };

    let filter = SaleFilter {
        client_id,
        seller_id: query.vendedor_id.clone(),
        from: query.fecha_inicio,
        to: query.fecha_fin,
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(50),
    };

    let cache_key = format!(
        "ventas:{}:{}:{}:{}:{}:{}",
        filter.client_id.as_deref().unwrap_or("*"),
        filter.seller_id.as_deref().unwrap_or("*"),
        filter.from.map(|d| d.to_string()).unwrap_or_default(),
        filter.to.map(|d| d.to_string()).unwrap_or_default(),
        filter.page.max(1),
        filter.limit(),
    );

    if let Some(hit) = state.cache.get(&cache_key) {
        debug!(key = %cache_key, "ventas cache hit");
        return Ok(Json(hit));
    }

    let sales = state.db.sales().list(&filter).await?;
    let body = json!({ "data": sales });
    state.cache.put(&cache_key, body.clone());

    Ok(Json(body))
}

/// Rate-limit key for the caller: the forwarded client address when the
/// platform proxy provides one.
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "local".to_string())
}
