//! # predio-core: Pure Business Logic for the Predio CRM
//!
//! This crate is the **heart** of the sales & payment ledger engine. It
//! contains all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Predio CRM Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   HTTP surface (apps/api)                        │   │
//! │  │    POST /ventas · GET /ventas · POST /pagos · Stripe webhooks   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                predio-db (transactional services)                │   │
//! │  │    Sale Originator · Payment Ledger · Webhook Reconciler        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ predio-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌──────────────┐ ┌────────────┐ ┌───────────┐  │   │
//! │  │   │   types   │ │ amortization │ │ commission │ │ validation│  │   │
//! │  │   │ Sale, Lot │ │   annuity    │ │ milestones │ │   rules   │  │   │
//! │  │   │Installment│ │   schedule   │ │   30/30/40 │ │   checks  │  │   │
//! │  │   └───────────┘ └──────────────┘ └────────────┘ └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Lot, Sale, Installment, Commission, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`amortization`] - Installment schedule generator
//! - [`commission`] - Seller commission scheduler
//! - [`policy`] - Tunable business constants (late fee, milestone split)
//! - [`validation`] - Request input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every generator is deterministic - same input =
//!    same schedule
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all persisted monetary values are centavos (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod amortization;
pub mod commission;
pub mod error;
pub mod money;
pub mod policy;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use predio_core::Money` instead of
// `use predio_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use policy::{CommissionPolicy, LedgerPolicy};
pub use types::*;
