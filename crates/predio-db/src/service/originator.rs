//! # Sale Originator
//!
//! Orchestrates lot validation/locking, sale creation and schedule
//! generation inside one ACID transaction.
//!
//! ## Origination Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    1. load client                → ClienteNotFound                      │
//! │    2. load lot                   → LoteNotFound                         │
//! │       lot not available          → LoteNotAvailable                     │
//! │    3. enganche ≤ list price      → InvalidAmount                        │
//! │    4. claim lot (conditional     → LoteNotAvailable (lost the race)     │
//! │       UPDATE ... WHERE                                                  │
//! │       status='available')                                               │
//! │    5. insert sale (apartado, or liquidado when paid up front)           │
//! │    6. term > 0: generate + bulk-insert amortization schedule            │
//! │    7. seller set: generate + bulk-insert commission schedule            │
//! │    8. post_process_status ← ok                                          │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure in 1-8 rolls everything back: no partial sale, no          │
//! │  orphaned lot reservation, no partial schedule.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::pool::Database;
use crate::service::ServiceResult;
use predio_core::amortization::build_schedule;
use predio_core::commission::build_commissions;
use predio_core::{
    CommissionPolicy, CoreError, InterestRate, LotStatus, Money, PostProcessStatus, Sale,
    SaleStatus,
};

/// Input for a new sale, already validated at the API boundary.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub client_id: String,
    pub lot_id: String,
    pub seller_id: Option<String>,
    pub down_payment: Money,
    /// Zero means unfinanced.
    pub term_months: u32,
    pub annual_rate: InterestRate,
    pub sale_date: NaiveDate,
}

/// The sale origination service.
#[derive(Debug, Clone)]
pub struct SaleOriginator {
    db: Database,
    commission_policy: CommissionPolicy,
}

impl SaleOriginator {
    /// Creates the originator with its commission policy.
    pub fn new(db: Database, commission_policy: CommissionPolicy) -> Self {
        SaleOriginator {
            db,
            commission_policy,
        }
    }

    /// Creates a sale, its amortization schedule and its commissions,
    /// all-or-nothing.
    pub async fn create_sale(&self, input: NewSale) -> ServiceResult<Sale> {
        let mut tx = self.db.begin().await?;

        // 1. Client must exist.
        self.db
            .clients()
            .get_by_id_tx(&mut tx, &input.client_id)
            .await?
            .ok_or_else(|| CoreError::ClientNotFound(input.client_id.clone()))?;

        // 2. Lot must exist and be available.
        let lot = self
            .db
            .lots()
            .get_by_id_tx(&mut tx, &input.lot_id)
            .await?
            .ok_or_else(|| CoreError::LotNotFound(input.lot_id.clone()))?;

        if lot.status != LotStatus::Available {
            return Err(CoreError::LotNotAvailable {
                lot_id: lot.id,
                status: lot.status.as_str().to_string(),
            }
            .into());
        }

        // 3. The down payment cannot exceed the price.
        if input.down_payment > lot.list_price() {
            return Err(CoreError::invalid_amount(
                "monto_enganche",
                format!(
                    "down payment {} exceeds list price {}",
                    input.down_payment,
                    lot.list_price()
                ),
            )
            .into());
        }

        let fully_paid = input.down_payment == lot.list_price();

        // 4. Claim the lot. The conditional UPDATE serializes concurrent
        // originations against the same lot; exactly one succeeds.
        let target = if fully_paid {
            LotStatus::Sold
        } else {
            LotStatus::Reserved
        };
        let claimed = self
            .db
            .lots()
            .claim_available(&mut tx, &lot.id, target)
            .await?;
        if !claimed {
            return Err(CoreError::LotNotAvailable {
                lot_id: lot.id,
                status: "reserved".to_string(),
            }
            .into());
        }

        // 5. The sale itself.
        let now = Utc::now();
        let sale = Sale {
            id: crate::repository::new_id(),
            client_id: input.client_id.clone(),
            lot_id: lot.id.clone(),
            seller_id: input.seller_id.clone(),
            total_cents: lot.list_price_cents,
            down_payment_cents: input.down_payment.cents(),
            term_months: input.term_months as i64,
            annual_rate_bps: input.annual_rate.bps() as i64,
            sale_date: input.sale_date,
            status: if fully_paid {
                SaleStatus::Liquidado
            } else {
                SaleStatus::Apartado
            },
            post_process_status: PostProcessStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.db.sales().insert(&mut tx, &sale).await?;

        // 6. Amortization schedule for financed sales.
        let principal = sale.principal();
        if input.term_months > 0 && principal.is_positive() {
            let rows = build_schedule(
                principal,
                input.term_months,
                input.annual_rate,
                input.sale_date,
            )?;
            self.db
                .installments()
                .insert_schedule(&mut tx, &sale.id, &rows)
                .await?;
        }

        // 7. Commission schedule when a seller gets credit.
        if let Some(seller_id) = &input.seller_id {
            let seller = self
                .db
                .sellers()
                .get_by_id_tx(&mut tx, seller_id)
                .await?
                .ok_or_else(|| CoreError::SellerNotFound(seller_id.clone()))?;

            let drafts = build_commissions(
                &seller,
                Money::from_cents(sale.total_cents),
                &self.commission_policy,
                input.sale_date,
            );
            self.db
                .commissions()
                .insert_drafts(&mut tx, &sale.id, seller_id, &drafts)
                .await?;
        }

        // 8. Generation succeeded; clear the repair marker before commit.
        self.db
            .sales()
            .set_post_process_status(&mut tx, &sale.id, PostProcessStatus::Ok)
            .await?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            lot_id = %sale.lot_id,
            total = sale.total_cents,
            term_months = sale.term_months,
            "Venta created"
        );

        Ok(Sale {
            post_process_status: PostProcessStatus::Ok,
            ..sale
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceError;
    use crate::testutil::{seed_client, seed_lot, seed_seller, test_db};
    use predio_core::{CommissionScheme, InstallmentStatus};

    fn new_sale(client_id: &str, lot_id: &str) -> NewSale {
        NewSale {
            client_id: client_id.to_string(),
            lot_id: lot_id.to_string(),
            seller_id: None,
            down_payment: Money::from_cents(3_000_000),
            term_months: 12,
            annual_rate: InterestRate::from_percentage(10.0),
            sale_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_financed_sale_generates_full_schedule() {
        let db = test_db().await;
        let client = seed_client(&db).await;
        let lot = seed_lot(&db, 15_000_000).await;

        let originator = SaleOriginator::new(db.clone(), CommissionPolicy::default());
        let sale = originator
            .create_sale(new_sale(&client.id, &lot.id))
            .await
            .unwrap();

        assert_eq!(sale.status, SaleStatus::Apartado);
        assert_eq!(sale.post_process_status, PostProcessStatus::Ok);
        assert_eq!(sale.total_cents, 15_000_000);

        let installments = db.installments().list_by_sale(&sale.id).await.unwrap();
        assert_eq!(installments.len(), 12);
        assert!(installments
            .iter()
            .all(|i| i.status == InstallmentStatus::Pendiente));
        assert_eq!(installments.last().unwrap().closing_balance_cents, 0);

        // principal conserved: 15,000,000 - 3,000,000
        let repaid: i64 = installments.iter().map(|i| i.principal_cents).sum();
        assert_eq!(repaid, 12_000_000);

        let stored_lot = db.lots().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(stored_lot.status, LotStatus::Reserved);
    }

    #[tokio::test]
    async fn test_create_sale_with_seller_generates_commissions() {
        let db = test_db().await;
        let client = seed_client(&db).await;
        let lot = seed_lot(&db, 15_000_000).await;
        let seller = seed_seller(&db, CommissionScheme::Porcentaje, Some(500), 0).await;

        let originator = SaleOriginator::new(db.clone(), CommissionPolicy::default());
        let mut input = new_sale(&client.id, &lot.id);
        input.seller_id = Some(seller.id.clone());

        let sale = originator.create_sale(input).await.unwrap();

        let commissions = db.commissions().list_by_sale(&sale.id).await.unwrap();
        assert_eq!(commissions.len(), 3);
        // 5% of $150,000.00 = $7,500.00 split 30/30/40
        let total: i64 = commissions.iter().map(|c| c.commission_cents).sum();
        assert_eq!(total, 750_000);
    }

    #[tokio::test]
    async fn test_missing_client_rolls_back() {
        let db = test_db().await;
        let lot = seed_lot(&db, 15_000_000).await;

        let originator = SaleOriginator::new(db.clone(), CommissionPolicy::default());
        let err = originator
            .create_sale(new_sale("no-such-client", &lot.id))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::ClientNotFound(_))
        ));

        // the lot is untouched
        let stored_lot = db.lots().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(stored_lot.status, LotStatus::Available);
    }

    #[tokio::test]
    async fn test_down_payment_exceeding_price_rejected() {
        let db = test_db().await;
        let client = seed_client(&db).await;
        let lot = seed_lot(&db, 15_000_000).await;

        let originator = SaleOriginator::new(db.clone(), CommissionPolicy::default());
        let mut input = new_sale(&client.id, &lot.id);
        input.down_payment = Money::from_cents(16_000_000); // enganche 160,000 > 150,000

        let err = originator.create_sale(input).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InvalidAmount { .. })
        ));

        let stored_lot = db.lots().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(stored_lot.status, LotStatus::Available);
    }

    #[tokio::test]
    async fn test_second_sale_for_same_lot_loses() {
        let db = test_db().await;
        let client = seed_client(&db).await;
        let lot = seed_lot(&db, 15_000_000).await;

        let originator = SaleOriginator::new(db.clone(), CommissionPolicy::default());
        originator
            .create_sale(new_sale(&client.id, &lot.id))
            .await
            .unwrap();

        let err = originator
            .create_sale(new_sale(&client.id, &lot.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::LotNotAvailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_schedule_rolls_back_sale_and_lot() {
        let db = test_db().await;
        let client = seed_client(&db).await;
        let lot = seed_lot(&db, 15_000_000).await;

        let originator = SaleOriginator::new(db.clone(), CommissionPolicy::default());
        let mut input = new_sale(&client.id, &lot.id);
        // a seller id that doesn't exist fails step 7 after the sale and
        // schedule were written
        input.seller_id = Some("no-such-seller".to_string());

        let err = originator.create_sale(input).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::SellerNotFound(_))
        ));

        // nothing survived the rollback
        let stored_lot = db.lots().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(stored_lot.status, LotStatus::Available);

        let sales = db
            .sales()
            .list(&crate::repository::sale::SaleFilter {
                client_id: Some(client.id.clone()),
                page: 1,
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(sales.is_empty());
    }

    #[tokio::test]
    async fn test_full_price_down_payment_liquidates_immediately() {
        let db = test_db().await;
        let client = seed_client(&db).await;
        let lot = seed_lot(&db, 15_000_000).await;

        let originator = SaleOriginator::new(db.clone(), CommissionPolicy::default());
        let mut input = new_sale(&client.id, &lot.id);
        input.down_payment = Money::from_cents(15_000_000);

        let sale = originator.create_sale(input).await.unwrap();
        assert_eq!(sale.status, SaleStatus::Liquidado);

        let stored_lot = db.lots().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(stored_lot.status, LotStatus::Sold);

        // nothing to amortize
        let installments = db.installments().list_by_sale(&sale.id).await.unwrap();
        assert!(installments.is_empty());
    }

    #[tokio::test]
    async fn test_unfinanced_sale_has_no_schedule() {
        let db = test_db().await;
        let client = seed_client(&db).await;
        let lot = seed_lot(&db, 15_000_000).await;

        let originator = SaleOriginator::new(db.clone(), CommissionPolicy::default());
        let mut input = new_sale(&client.id, &lot.id);
        input.term_months = 0;

        let sale = originator.create_sale(input).await.unwrap();
        assert_eq!(sale.status, SaleStatus::Apartado);

        let installments = db.installments().list_by_sale(&sale.id).await.unwrap();
        assert!(installments.is_empty());
    }
}
