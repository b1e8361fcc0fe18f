//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. The business constants (late fee, commission split) live here
//! so deployments can tune them without a rebuild.

use std::env;

use predio_core::{CommissionPolicy, LedgerPolicy};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,

    /// Late fee in basis points of the installment amount (default 500 = 5%)
    pub late_fee_bps: u32,

    /// Default seller commission rate in basis points (default 500 = 5%)
    pub commission_rate_bps: u32,

    /// Commission milestone split [enganche, contrato, liquidación] in bps
    /// of the commission; must sum to 10000 (default 3000,3000,4000)
    pub commission_split_bps: [u32; 3],

    /// Read-cache TTL in seconds (default 30)
    pub cache_ttl_secs: u64,

    /// Requests allowed per rate-limit window (default 60)
    pub rate_limit_max: u32,

    /// Rate-limit window length in seconds (default 60)
    pub rate_limit_window_secs: u64,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: parse_env("HTTP_PORT", 8080)?,

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./predio.db".to_string()),

            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
                // In production this MUST be set via environment variable
                "whsec_predio_dev_secret_change_in_production".to_string()
            }),

            late_fee_bps: parse_env("LATE_FEE_BPS", 500)?,

            commission_rate_bps: parse_env("COMMISSION_RATE_BPS", 500)?,

            commission_split_bps: parse_split(
                env::var("COMMISSION_SPLIT_BPS").ok().as_deref(),
            )?,

            cache_ttl_secs: parse_env("CACHE_TTL_SECS", 30)?,

            rate_limit_max: parse_env("RATE_LIMIT_MAX", 60)?,

            rate_limit_window_secs: parse_env("RATE_LIMIT_WINDOW_SECS", 60)?,
        };

        let split_sum: u32 = config.commission_split_bps.iter().sum();
        if split_sum != 10_000 {
            return Err(ConfigError::InvalidValue("COMMISSION_SPLIT_BPS".into()));
        }

        Ok(config)
    }

    /// Ledger policy derived from this configuration.
    pub fn ledger_policy(&self) -> LedgerPolicy {
        LedgerPolicy {
            late_fee_bps: self.late_fee_bps,
        }
    }

    /// Commission policy derived from this configuration.
    pub fn commission_policy(&self) -> CommissionPolicy {
        CommissionPolicy {
            default_rate_bps: self.commission_rate_bps,
            milestone_split_bps: self.commission_split_bps,
        }
    }
}

impl Default for ApiConfig {
    /// Defaults without touching the environment (used by tests).
    fn default() -> Self {
        ApiConfig {
            http_port: 8080,
            database_path: "./predio.db".to_string(),
            stripe_webhook_secret: "whsec_predio_dev_secret_change_in_production".to_string(),
            late_fee_bps: 500,
            commission_rate_bps: 500,
            commission_split_bps: [3000, 3000, 4000],
            cache_ttl_secs: 30,
            rate_limit_max: 60,
            rate_limit_window_secs: 60,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Parses "3000,3000,4000" into the milestone split.
fn parse_split(raw: Option<&str>) -> Result<[u32; 3], ConfigError> {
    let Some(raw) = raw else {
        return Ok([3000, 3000, 4000]);
    };

    let parts: Vec<u32> = raw
        .split(',')
        .map(|p| p.trim().parse())
        .collect::<Result<_, _>>()
        .map_err(|_| ConfigError::InvalidValue("COMMISSION_SPLIT_BPS".into()))?;

    if parts.len() != 3 {
        return Err(ConfigError::InvalidValue("COMMISSION_SPLIT_BPS".into()));
    }
    Ok([parts[0], parts[1], parts[2]])
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
