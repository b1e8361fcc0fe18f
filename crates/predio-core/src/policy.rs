//! # Business Policies
//!
//! Tunable business constants, carried as explicit structs instead of
//! literals buried in the algorithms. The server loads overrides from its
//! environment configuration and injects them into the services.

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ValidationError};

/// Payment ledger policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LedgerPolicy {
    /// Late fee (mora) as basis points of the installment's `amount_due`,
    /// applied at most once per installment. 500 bps = 5%.
    pub late_fee_bps: u32,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        LedgerPolicy { late_fee_bps: 500 }
    }
}

/// Commission scheduling policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CommissionPolicy {
    /// Rate used when a seller has no rate of their own. 500 bps = 5%.
    pub default_rate_bps: u32,

    /// Milestone split of the total commission, in basis points of the
    /// commission itself: [enganche, contrato, liquidación]. Must sum to
    /// 10000. Default 30/30/40.
    pub milestone_split_bps: [u32; 3],
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        CommissionPolicy {
            default_rate_bps: 500,
            milestone_split_bps: [3000, 3000, 4000],
        }
    }
}

impl CommissionPolicy {
    /// Checks the milestone split covers the whole commission.
    pub fn validate(&self) -> CoreResult<()> {
        let sum: u32 = self.milestone_split_bps.iter().sum();
        if sum != 10_000 {
            return Err(ValidationError::InvalidFormat {
                field: "milestone_split_bps".to_string(),
                reason: format!("must sum to 10000 bps, got {sum}"),
            }
            .into());
        }
        Ok(())
    }
}
