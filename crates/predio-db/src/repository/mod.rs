//! # Repositories
//!
//! One typed repository per entity, replacing the generic per-collection
//! record store the platform exposes with explicit methods.
//!
//! ## Transaction convention
//! Every mutating method (and every read that participates in a decision
//! inside a mutation) takes `&mut SqliteConnection`, so the service layer
//! decides the transaction boundary. Plain pool-backed methods exist only
//! for standalone reads on the query path.

pub mod client;
pub mod commission;
pub mod event;
pub mod installment;
pub mod lot;
pub mod sale;
pub mod seller;

use uuid::Uuid;

/// Generates a new entity id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
