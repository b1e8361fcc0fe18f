//! # predio-db: Database Layer for the Predio CRM
//!
//! This crate provides storage and the transaction boundaries for the sales
//! & payment ledger engine. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Predio CRM Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /ventas, POST /pagos, webhook)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    predio-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌───────────────┐   ┌──────────────────┐  │   │
//! │  │   │   services   │   │  repositories │   │   Database       │  │   │
//! │  │   │              │   │               │   │   (pool.rs)      │  │   │
//! │  │   │ Originator   │──►│ SaleRepo      │──►│                  │  │   │
//! │  │   │ Ledger       │   │ LotRepo       │   │ SqlitePool       │  │   │
//! │  │   │ Reconciler   │   │ Installment.. │   │ + migrations     │  │   │
//! │  │   └──────────────┘   └───────────────┘   └──────────────────┘  │   │
//! │  │         │                                                      │   │
//! │  │         └── one transaction per request: commit or roll back   │   │
//! │  │             the whole operation                                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL) — migrations/sqlite/*.sql                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Typed repositories (lot, sale, installment, ...)
//! - [`service`] - Transactional services (originator, ledger, reconciler)

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::client::ClientRepository;
pub use repository::commission::CommissionRepository;
pub use repository::event::EventRepository;
pub use repository::installment::InstallmentRepository;
pub use repository::lot::LotRepository;
pub use repository::sale::{SaleFilter, SaleRepository};
pub use repository::seller::SellerRepository;

// Service re-exports
pub use service::ledger::{PaymentEntry, PaymentLedger, PaymentTarget};
pub use service::originator::{NewSale, SaleOriginator};
pub use service::reconcile::{ProcessorEvent, ReconcileOutcome, WebhookReconciler};
pub use service::{ServiceError, ServiceResult};
