//! # Webhook Reconciler
//!
//! Turns verified processor events into ledger mutations, exactly once.
//!
//! ## Idempotency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT OR IGNORE processed_events(event_id)                          │
//! │      0 rows → already processed → COMMIT, ack, no side effects          │
//! │      1 row  → this delivery owns the event                              │
//! │    dispatch by kind:                                                    │
//! │      payment succeeded → post the confirmed amount via the ledger       │
//! │                          (no-op when the installment is already pagado) │
//! │      payment failed    → append an explanatory note, amounts untouched  │
//! │      anything else     → log and ack                                    │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  The claim and the mutation share one transaction, so a crash between   │
//! │  them rolls the claim back and the processor's retry starts clean.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Signature verification happens at the HTTP boundary, before anything
//! reaches this service.

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::pool::Database;
use crate::service::{ledger, ServiceResult};
use predio_core::{CoreError, LedgerPolicy, Money, ValidationError};

/// A processor event, already authenticated and shaped.
///
/// Tagged dispatch instead of string comparisons falling through to a
/// default: unknown kinds are an explicit variant the handler acknowledges.
#[derive(Debug, Clone)]
pub enum ProcessorEvent {
    PaymentSucceeded {
        event_id: String,
        payment_intent_id: String,
        /// Confirmed amount, already in centavos on the wire.
        amount: Money,
        /// Masked card suffix, when the processor shares it.
        card_last4: Option<String>,
    },
    PaymentFailed {
        event_id: String,
        payment_intent_id: String,
        reason: Option<String>,
    },
    Unhandled {
        event_id: String,
        kind: String,
    },
}

impl ProcessorEvent {
    /// The processor's unique event id, the idempotency key.
    pub fn event_id(&self) -> &str {
        match self {
            ProcessorEvent::PaymentSucceeded { event_id, .. } => event_id,
            ProcessorEvent::PaymentFailed { event_id, .. } => event_id,
            ProcessorEvent::Unhandled { event_id, .. } => event_id,
        }
    }

    /// Shapes a verified Stripe payload into an event.
    ///
    /// Only the fields this engine consumes are read; everything else in
    /// the payload is ignored.
    pub fn from_payload(payload: &Value) -> Result<ProcessorEvent, CoreError> {
        let event_id = required_str(payload, "id")?;
        let kind = required_str(payload, "type")?;
        let object = &payload["data"]["object"];

        let event = match kind.as_str() {
            "payment_intent.succeeded" => {
                let payment_intent_id = object["id"]
                    .as_str()
                    .ok_or_else(|| missing("data.object.id"))?
                    .to_string();
                let amount_cents = object["amount_received"]
                    .as_i64()
                    .or_else(|| object["amount"].as_i64())
                    .ok_or_else(|| missing("data.object.amount_received"))?;
                let card_last4 = object["charges"]["data"][0]["payment_method_details"]["card"]
                    ["last4"]
                    .as_str()
                    .map(|s| s.to_string());

                ProcessorEvent::PaymentSucceeded {
                    event_id,
                    payment_intent_id,
                    amount: Money::from_cents(amount_cents),
                    card_last4,
                }
            }

            "payment_intent.payment_failed" => {
                let payment_intent_id = object["id"]
                    .as_str()
                    .ok_or_else(|| missing("data.object.id"))?
                    .to_string();
                let reason = object["last_payment_error"]["message"]
                    .as_str()
                    .map(|s| s.to_string());

                ProcessorEvent::PaymentFailed {
                    event_id,
                    payment_intent_id,
                    reason,
                }
            }

            other => ProcessorEvent::Unhandled {
                event_id,
                kind: other.to_string(),
            },
        };

        Ok(event)
    }
}

fn required_str(payload: &Value, field: &str) -> Result<String, CoreError> {
    payload[field]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| missing(field))
}

fn missing(field: &str) -> CoreError {
    CoreError::Validation(ValidationError::Required {
        field: field.to_string(),
    })
}

/// What the reconciler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Payment posted to the ledger.
    Applied,
    /// Event id seen before; nothing re-applied.
    AlreadyProcessed,
    /// Target installment was already pagado; nothing to do.
    AlreadySettled,
    /// Failure note recorded; amounts and status untouched.
    NotedFailure,
    /// Unrecognized kind, acknowledged without local handling.
    Ignored,
}

/// The webhook reconciliation service.
#[derive(Debug, Clone)]
pub struct WebhookReconciler {
    db: Database,
    policy: LedgerPolicy,
}

impl WebhookReconciler {
    /// Creates the reconciler with the ledger's late-fee policy (confirmed
    /// payments post through the same path as manual ones).
    pub fn new(db: Database, policy: LedgerPolicy) -> Self {
        WebhookReconciler { db, policy }
    }

    /// Processes one verified event. Safe to call any number of times with
    /// the same event id: only the first delivery mutates state.
    pub async fn handle(
        &self,
        event: ProcessorEvent,
        today: NaiveDate,
    ) -> ServiceResult<ReconcileOutcome> {
        let mut tx = self.db.begin().await?;

        let claimed = self
            .db
            .events()
            .insert_if_absent(&mut tx, event.event_id(), Utc::now())
            .await?;
        if !claimed {
            tx.commit().await?;
            info!(event_id = %event.event_id(), "Duplicate processor event ignored");
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }

        let outcome = match event {
            ProcessorEvent::PaymentSucceeded {
                event_id,
                payment_intent_id,
                amount,
                card_last4,
            } => {
                let installment = self
                    .db
                    .installments()
                    .get_by_payment_intent_tx(&mut tx, &payment_intent_id)
                    .await?
                    .ok_or_else(|| CoreError::InstallmentNotFound(payment_intent_id.clone()))?;

                if installment.is_settled() {
                    info!(
                        event_id = %event_id,
                        installment_id = %installment.id,
                        "Confirmed payment for an installment already pagado"
                    );
                    ReconcileOutcome::AlreadySettled
                } else {
                    let note = match &card_last4 {
                        Some(last4) => {
                            format!("Pago confirmado por Stripe (tarjeta ****{last4})")
                        }
                        None => "Pago confirmado por Stripe".to_string(),
                    };
                    let updated = ledger::post_amount(
                        &mut tx,
                        &self.db,
                        &self.policy,
                        installment,
                        amount,
                        today,
                        Some(&note),
                    )
                    .await?;
                    ledger::settle_sale_if_paid(&mut tx, &self.db, &updated.sale_id).await?;

                    info!(
                        event_id = %event_id,
                        installment_id = %updated.id,
                        amount = amount.cents(),
                        "Processor payment applied"
                    );
                    ReconcileOutcome::Applied
                }
            }

            ProcessorEvent::PaymentFailed {
                event_id,
                payment_intent_id,
                reason,
            } => {
                let installment = self
                    .db
                    .installments()
                    .get_by_payment_intent_tx(&mut tx, &payment_intent_id)
                    .await?
                    .ok_or_else(|| CoreError::InstallmentNotFound(payment_intent_id.clone()))?;

                let note = format!(
                    "Intento de pago fallido: {}",
                    reason.as_deref().unwrap_or("sin detalle del procesador")
                );
                self.db
                    .installments()
                    .append_note_tx(&mut tx, &installment.id, &note)
                    .await?;

                info!(event_id = %event_id, installment_id = %installment.id, "Failed payment noted");
                ReconcileOutcome::NotedFailure
            }

            ProcessorEvent::Unhandled { event_id, kind } => {
                warn!(event_id = %event_id, kind = %kind, "Unhandled processor event kind");
                ReconcileOutcome::Ignored
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::originator::{NewSale, SaleOriginator};
    use crate::service::ServiceError;
    use crate::testutil::{seed_client, seed_lot, test_db};
    use predio_core::{CommissionPolicy, InstallmentStatus, InterestRate};
    use serde_json::json;

    async fn sale_with_intent(db: &Database) -> (predio_core::Sale, predio_core::Installment) {
        let client = seed_client(db).await;
        let lot = seed_lot(db, 15_000_000).await;

        let sale = SaleOriginator::new(db.clone(), CommissionPolicy::default())
            .create_sale(NewSale {
                client_id: client.id,
                lot_id: lot.id,
                seller_id: None,
                down_payment: Money::from_cents(3_000_000),
                term_months: 12,
                annual_rate: InterestRate::zero(),
                sale_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            })
            .await
            .unwrap();

        let first = db.installments().list_by_sale(&sale.id).await.unwrap()[0].clone();
        db.installments()
            .set_payment_intent(&first.id, "pi_test_123")
            .await
            .unwrap();

        (sale, first)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()
    }

    fn succeeded(event_id: &str, amount_cents: i64) -> ProcessorEvent {
        ProcessorEvent::PaymentSucceeded {
            event_id: event_id.to_string(),
            payment_intent_id: "pi_test_123".to_string(),
            amount: Money::from_cents(amount_cents),
            card_last4: Some("4242".to_string()),
        }
    }

    #[tokio::test]
    async fn test_succeeded_event_applies_payment() {
        let db = test_db().await;
        let (_, installment) = sale_with_intent(&db).await;
        let reconciler = WebhookReconciler::new(db.clone(), LedgerPolicy::default());

        let outcome = reconciler
            .handle(succeeded("evt_1", 1_000_000), today())
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Applied);

        let stored = db
            .installments()
            .get_by_id(&installment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.amount_paid_cents, 1_000_000);
        assert_eq!(stored.status, InstallmentStatus::Pagado);
        assert!(stored.notes.unwrap().contains("****4242"));
    }

    #[tokio::test]
    async fn test_duplicate_event_id_applies_once() {
        let db = test_db().await;
        let (_, installment) = sale_with_intent(&db).await;
        let reconciler = WebhookReconciler::new(db.clone(), LedgerPolicy::default());

        let first = reconciler
            .handle(succeeded("evt_dup", 400_000), today())
            .await
            .unwrap();
        assert_eq!(first, ReconcileOutcome::Applied);

        // the processor redelivers the exact same event
        let second = reconciler
            .handle(succeeded("evt_dup", 400_000), today())
            .await
            .unwrap();
        assert_eq!(second, ReconcileOutcome::AlreadyProcessed);

        let stored = db
            .installments()
            .get_by_id(&installment.id)
            .await
            .unwrap()
            .unwrap();
        // one mutation, not two
        assert_eq!(stored.amount_paid_cents, 400_000);
        assert_eq!(stored.status, InstallmentStatus::Parcial);
    }

    #[tokio::test]
    async fn test_distinct_events_both_apply() {
        let db = test_db().await;
        let (_, installment) = sale_with_intent(&db).await;
        let reconciler = WebhookReconciler::new(db.clone(), LedgerPolicy::default());

        reconciler
            .handle(succeeded("evt_a", 400_000), today())
            .await
            .unwrap();
        reconciler
            .handle(succeeded("evt_b", 600_000), today())
            .await
            .unwrap();

        let stored = db
            .installments()
            .get_by_id(&installment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.amount_paid_cents, 1_000_000);
        assert_eq!(stored.status, InstallmentStatus::Pagado);
    }

    #[tokio::test]
    async fn test_succeeded_on_settled_installment_is_noop() {
        let db = test_db().await;
        let (_, installment) = sale_with_intent(&db).await;
        let reconciler = WebhookReconciler::new(db.clone(), LedgerPolicy::default());

        reconciler
            .handle(succeeded("evt_1", 1_000_000), today())
            .await
            .unwrap();

        // a different event confirms the same, already-settled installment
        let outcome = reconciler
            .handle(succeeded("evt_2", 1_000_000), today())
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::AlreadySettled);

        let stored = db
            .installments()
            .get_by_id(&installment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.amount_paid_cents, 1_000_000);
    }

    #[tokio::test]
    async fn test_failed_event_notes_without_mutating_amounts() {
        let db = test_db().await;
        let (_, installment) = sale_with_intent(&db).await;
        let reconciler = WebhookReconciler::new(db.clone(), LedgerPolicy::default());

        let outcome = reconciler
            .handle(
                ProcessorEvent::PaymentFailed {
                    event_id: "evt_fail".to_string(),
                    payment_intent_id: "pi_test_123".to_string(),
                    reason: Some("card_declined".to_string()),
                },
                today(),
            )
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::NotedFailure);

        let stored = db
            .installments()
            .get_by_id(&installment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.amount_paid_cents, 0);
        assert_eq!(stored.status, InstallmentStatus::Pendiente);
        assert!(stored.notes.unwrap().contains("card_declined"));
    }

    #[tokio::test]
    async fn test_unhandled_kind_acknowledged() {
        let db = test_db().await;
        let reconciler = WebhookReconciler::new(db.clone(), LedgerPolicy::default());

        let outcome = reconciler
            .handle(
                ProcessorEvent::Unhandled {
                    event_id: "evt_other".to_string(),
                    kind: "customer.created".to_string(),
                },
                today(),
            )
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Ignored);

        // still recorded for idempotency
        assert!(db.events().get("evt_other").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_intent_errors_and_releases_claim() {
        let db = test_db().await;
        let reconciler = WebhookReconciler::new(db.clone(), LedgerPolicy::default());

        let err = reconciler
            .handle(
                ProcessorEvent::PaymentSucceeded {
                    event_id: "evt_orphan".to_string(),
                    payment_intent_id: "pi_unknown".to_string(),
                    amount: Money::from_cents(1_000),
                    card_last4: None,
                },
                today(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InstallmentNotFound(_))
        ));

        // the claim rolled back with the transaction, so a retry can
        // succeed once the association exists
        assert!(db.events().get("evt_orphan").await.unwrap().is_none());
    }

    #[test]
    fn test_from_payload_shapes_succeeded_event() {
        let payload = json!({
            "id": "evt_123",
            "type": "payment_intent.succeeded",
            "data": {
                "object": {
                    "id": "pi_456",
                    "amount_received": 791243,
                    "charges": {
                        "data": [{
                            "payment_method_details": { "card": { "last4": "4242" } }
                        }]
                    }
                }
            }
        });

        match ProcessorEvent::from_payload(&payload).unwrap() {
            ProcessorEvent::PaymentSucceeded {
                event_id,
                payment_intent_id,
                amount,
                card_last4,
            } => {
                assert_eq!(event_id, "evt_123");
                assert_eq!(payment_intent_id, "pi_456");
                assert_eq!(amount.cents(), 791243);
                assert_eq!(card_last4.as_deref(), Some("4242"));
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_from_payload_unknown_kind() {
        let payload = json!({
            "id": "evt_x",
            "type": "charge.refunded",
            "data": { "object": {} }
        });

        assert!(matches!(
            ProcessorEvent::from_payload(&payload).unwrap(),
            ProcessorEvent::Unhandled { .. }
        ));
    }

    #[test]
    fn test_from_payload_rejects_missing_fields() {
        assert!(ProcessorEvent::from_payload(&json!({ "type": "x" })).is_err());
        assert!(ProcessorEvent::from_payload(&json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": { "object": {} }
        }))
        .is_err());
    }
}
