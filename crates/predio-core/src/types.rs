//! # Domain Types
//!
//! Core domain types for the sales & payment ledger engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Lot        │   │      Sale       │   │  Installment    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │──►│  lot_id (FK)    │──►│  sale_id (FK)   │       │
//! │  │  status         │   │  client_id (FK) │   │  number (1..N)  │       │
//! │  │  list_price     │   │  status         │   │  amount_due     │       │
//! │  └─────────────────┘   └────────┬────────┘   │  amount_paid    │       │
//! │                                 │            │  late_fee       │       │
//! │                                 ▼            └─────────────────┘       │
//! │                        ┌─────────────────┐   ┌─────────────────┐       │
//! │                        │   Commission    │   │ ProcessedEvent  │       │
//! │                        │  ─────────────  │   │  ─────────────  │       │
//! │                        │  sale_id (FK)   │   │  event_id (PK)  │       │
//! │                        │  kind           │   │  processed_at   │       │
//! │                        │  commission     │   └─────────────────┘       │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Machines
//! - Lot:         `available → reserved → sold` (origination / liquidation)
//! - Sale:        `apartado → activo → liquidado` (or `cancelado`)
//! - Installment: `pendiente → parcial → pagado` (forward only, `pagado`
//!   is terminal)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Interest Rate
// =============================================================================

/// Annual interest rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10.00% annual. Integer bps keep the persisted rate exact;
/// only the amortization math converts to floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestRate(u32);

impl InterestRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        InterestRate(bps)
    }

    /// Creates a rate from a percentage (`10.0` → 1000 bps).
    pub fn from_percentage(pct: f64) -> Self {
        InterestRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the annual rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the monthly rate as a fraction, the `i` of the annuity
    /// formula: `annual_bps / 10000 / 12`.
    #[inline]
    pub fn monthly(&self) -> f64 {
        self.0 as f64 / 10_000.0 / 12.0
    }

    /// Zero rate (interest-free financing).
    #[inline]
    pub const fn zero() -> Self {
        InterestRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for InterestRate {
    fn default() -> Self {
        InterestRate::zero()
    }
}

// =============================================================================
// Lot
// =============================================================================

/// The status of a lot (lote) in the development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum LotStatus {
    /// Lot can be sold.
    Available,
    /// Lot is held by a financed sale in progress.
    Reserved,
    /// Lot is fully paid for.
    Sold,
}

impl LotStatus {
    /// Lowercase label, matching the persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LotStatus::Available => "available",
            LotStatus::Reserved => "reserved",
            LotStatus::Sold => "sold",
        }
    }
}

/// A lot (parcel) offered for sale.
///
/// Mutated only by the Sale Originator (`available → reserved/sold`) and by
/// liquidation (`reserved → sold`). The conditional status update is the
/// serialization point for concurrent sales against the same lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Lot {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, e.g. "Manzana 3 Lote 14".
    pub name: String,

    /// Current status in the sale lifecycle.
    pub status: LotStatus,

    /// List price in centavos.
    pub list_price_cents: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lot {
    /// Returns the list price as a Money type.
    #[inline]
    pub fn list_price(&self) -> Money {
        Money::from_cents(self.list_price_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// The status of a sale (venta).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Down payment received, financing in progress.
    Apartado,
    /// Contract formalized (set by back-office tooling, not this engine).
    Activo,
    /// Every installment fully paid.
    Liquidado,
    /// Sale cancelled.
    Cancelado,
}

/// Whether schedule/commission generation completed for a sale.
///
/// Generation runs inside the origination transaction, so a committed sale
/// is normally `ok`. The `error` marker exists for the asynchronous repair
/// tooling that re-drives generation out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PostProcessStatus {
    Pending,
    Ok,
    Error,
}

/// A financing agreement over one lot between a client and the business.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Buying client.
    pub client_id: String,

    /// Lot being sold.
    pub lot_id: String,

    /// Seller credited with the sale, if any.
    pub seller_id: Option<String>,

    /// Full sale amount in centavos (the lot's list price at sale time).
    pub total_cents: i64,

    /// Down payment (enganche) in centavos.
    pub down_payment_cents: i64,

    /// Financing term in months. Zero means unfinanced.
    pub term_months: i64,

    /// Annual interest rate in basis points.
    pub annual_rate_bps: i64,

    /// Business date of the sale; installment due dates count from here.
    pub sale_date: NaiveDate,

    pub status: SaleStatus,

    pub post_process_status: PostProcessStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Financed principal: total minus down payment.
    #[inline]
    pub fn principal(&self) -> Money {
        Money::from_cents(self.total_cents - self.down_payment_cents)
    }

    /// Annual rate as a typed value.
    #[inline]
    pub fn annual_rate(&self) -> InterestRate {
        InterestRate::from_bps(self.annual_rate_bps as u32)
    }
}

// =============================================================================
// Installment
// =============================================================================

/// The payment status of one installment.
///
/// Transitions are monotonic: `pendiente → parcial → pagado`. The ledger
/// never moves an installment backwards, and `pagado` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    /// No money applied yet.
    Pendiente,
    /// Partially paid.
    Parcial,
    /// Fully paid (terminal).
    Pagado,
}

/// One scheduled payment (amortización) of a financed sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Installment {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub sale_id: String,

    /// 1-based position in the schedule, unique per sale.
    pub installment_number: i64,

    pub due_date: NaiveDate,

    /// Scheduled amount (interest + principal) in centavos.
    pub amount_due_cents: i64,

    /// Interest portion of `amount_due_cents`.
    pub interest_cents: i64,

    /// Principal portion of `amount_due_cents`.
    pub principal_cents: i64,

    /// Balance before this installment.
    pub opening_balance_cents: i64,

    /// Balance after this installment. Zero on the final row, exactly.
    pub closing_balance_cents: i64,

    /// Money applied so far (manual entries + processor confirmations).
    pub amount_paid_cents: i64,

    /// One-shot late fee (mora), zero until the first late payment.
    pub late_fee_cents: i64,

    pub status: InstallmentStatus,

    /// Free-form audit trail, newline-joined.
    pub notes: Option<String>,

    /// Processor payment-intent association, set when a client starts an
    /// online payment for this installment.
    pub payment_intent_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Installment {
    /// What is still owed: `amount_due + late_fee - amount_paid`.
    #[inline]
    pub fn remaining(&self) -> Money {
        Money::from_cents(self.amount_due_cents + self.late_fee_cents - self.amount_paid_cents)
    }

    /// Whether the installment is settled in full.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.status == InstallmentStatus::Pagado
    }
}

// =============================================================================
// Commission
// =============================================================================

/// How a seller is compensated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CommissionScheme {
    /// Percentage of the sale amount, split across milestones.
    Porcentaje,
    /// Single fixed amount.
    Fijo,
    /// Percentage milestones plus a fixed amount.
    Mixto,
}

/// The milestone (or fixed nature) of a commission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CommissionKind {
    /// Payable at down payment.
    Enganche,
    /// Payable at contract signing.
    Contrato,
    /// Payable at liquidation.
    Liquidacion,
    /// Fixed amount, not milestone-bound.
    Fijo,
}

/// Payment status of a commission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pendiente,
    Pagada,
}

/// Amount owed to a seller for a sale, split by milestone or fixed.
///
/// Created in bulk by the commission scheduler during origination;
/// read-only afterwards in this engine (payout is back-office tooling).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Commission {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub sale_id: String,

    pub seller_id: String,

    pub kind: CommissionKind,

    /// Sale amount the commission was computed from.
    pub sale_amount_cents: i64,

    /// The commission itself, rounded independently per record.
    pub commission_cents: i64,

    /// Effective rate in basis points (zero for fixed records).
    pub rate_bps: i64,

    pub status: CommissionStatus,

    pub scheduled_payment_date: NaiveDate,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Collaborator Entities
// =============================================================================

/// A client (buyer). Managed by the platform; read here during origination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A seller with their commission scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Seller {
    pub id: String,
    pub name: String,

    pub commission_scheme: CommissionScheme,

    /// Commission rate in basis points. `None` falls back to the configured
    /// default (500 bps unless overridden).
    pub commission_rate_bps: Option<i64>,

    /// Fixed commission in centavos (schemes `fijo` and `mixto`).
    pub fixed_commission_cents: i64,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Processed Event (idempotency log)
// =============================================================================

/// Record of an already-processed external processor event.
///
/// Existence of a row prevents a redelivered webhook from being applied
/// twice. Rows are only ever inserted, inside the same transaction as the
/// state mutation they guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProcessedEvent {
    pub event_id: String,
    pub processed_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interest_rate_conversions() {
        let rate = InterestRate::from_percentage(10.0);
        assert_eq!(rate.bps(), 1000);
        assert_eq!(rate.percentage(), 10.0);

        // 10% annual -> 0.8333...% monthly
        let monthly = rate.monthly();
        assert!((monthly - 0.10 / 12.0).abs() < 1e-12);

        assert!(InterestRate::zero().is_zero());
        assert!(!rate.is_zero());
    }

    #[test]
    fn test_installment_remaining() {
        let inst = Installment {
            id: "i1".to_string(),
            sale_id: "s1".to_string(),
            installment_number: 1,
            due_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            amount_due_cents: 100_000,
            interest_cents: 10_000,
            principal_cents: 90_000,
            opening_balance_cents: 1_000_000,
            closing_balance_cents: 910_000,
            amount_paid_cents: 30_000,
            late_fee_cents: 5_000,
            status: InstallmentStatus::Parcial,
            notes: None,
            payment_intent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        // 100,000 + 5,000 - 30,000
        assert_eq!(inst.remaining().cents(), 75_000);
        assert!(!inst.is_settled());
    }

    #[test]
    fn test_sale_principal() {
        let sale = Sale {
            id: "v1".to_string(),
            client_id: "c1".to_string(),
            lot_id: "l1".to_string(),
            seller_id: None,
            total_cents: 15_000_000,
            down_payment_cents: 3_000_000,
            term_months: 12,
            annual_rate_bps: 1000,
            sale_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            status: SaleStatus::Apartado,
            post_process_status: PostProcessStatus::Ok,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(sale.principal().cents(), 12_000_000);
        assert_eq!(sale.annual_rate().bps(), 1000);
    }
}
