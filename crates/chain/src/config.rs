//! Ledger configuration.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transactions per block unless configured otherwise.
pub const DEFAULT_BLOCK_SIZE: usize = 3;

/// Deadline applied to every coordination-store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(1);

/// Ledger configuration.
///
/// Durations are carried in milliseconds so the struct reads naturally from
/// a JSON config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Transactions per block.
    pub block_size: usize,
    /// Deadline for each coordination-store round trip.
    pub store_timeout_ms: u64,
    /// Sequencer attempts before giving up with `TooManyRetries`.
    pub max_attempts: u32,
    /// Backoff after the first lost race; doubles on each further loss.
    pub initial_backoff_ms: u64,
    /// Upper bound on the contention backoff.
    pub max_backoff_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT.as_millis() as u64,
            max_attempts: 64,
            initial_backoff_ms: 1,
            max_backoff_ms: 50,
        }
    }
}

impl LedgerConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Block size as used in index arithmetic.
    pub fn block_size_u64(&self) -> u64 {
        self.block_size as u64
    }

    /// Backoff before attempt `attempt + 1`, given that `attempt` (1-based) lost.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(LedgerError::InvalidConfig("block_size must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(LedgerError::InvalidConfig("max_attempts must be at least 1".into()));
        }
        if self.store_timeout_ms == 0 {
            return Err(LedgerError::InvalidConfig("store_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}
