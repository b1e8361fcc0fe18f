//! # Transactional Services
//!
//! The multi-step operations of the engine, each owning exactly one
//! transaction per request:
//!
//! - [`originator`] - creates a sale, its amortization schedule and its
//!   commission schedule atomically
//! - [`ledger`] - applies money to installments and detects liquidation
//! - [`reconcile`] - turns deduplicated processor events into ledger calls
//!
//! Repositories never open transactions themselves; the boundary lives
//! here, so a failure at any step rolls the whole operation back.

pub mod ledger;
pub mod originator;
pub mod reconcile;

use thiserror::Error;

use crate::error::DbError;
use predio_core::CoreError;

/// Errors surfaced by the service layer: either a business rule violation
/// or a storage failure.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<predio_core::ValidationError> for ServiceError {
    fn from(err: predio_core::ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

// Raw sqlx errors (transaction begin/commit) categorize through DbError.
impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Db(err.into())
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
