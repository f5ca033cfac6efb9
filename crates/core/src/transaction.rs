//! Proposed and sequenced transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-submitted payload, before it has a place in the ledger.
///
/// `name` and `percent` are parallel arrays. Their lengths are not checked
/// here; callers own that contract.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProposedTransaction {
    /// Free-form content.
    pub content: String,
    /// Participant names.
    #[serde(default)]
    pub name: Vec<String>,
    /// Participant percentages, one per name.
    #[serde(default)]
    pub percent: Vec<i64>,
}

impl ProposedTransaction {
    pub fn new(content: impl Into<String>, name: Vec<String>, percent: Vec<i64>) -> Self {
        Self {
            content: content.into(),
            name,
            percent,
        }
    }
}

/// A proposal that has been assigned a sequence index.
///
/// This is the value persisted under the transaction's key, so the JSON
/// shape is part of the on-store format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(flatten)]
    pub proposed: ProposedTransaction,
    /// Moment the sequencer built this transaction.
    pub timestamp: DateTime<Utc>,
    /// Block this transaction belongs to.
    pub block_num: u64,
    /// Position inside the block, `0..block_size`.
    pub tx_number: u64,
}

impl Transaction {
    /// Place a proposal at `index`. Block number and in-block position are
    /// both derived from the index alone.
    pub fn sequenced(
        proposed: ProposedTransaction,
        index: u64,
        block_size: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            proposed,
            timestamp,
            block_num: index / block_size,
            tx_number: index % block_size,
        }
    }

    /// Global sequence index of this transaction.
    pub fn sequence_index(&self, block_size: u64) -> u64 {
        self.block_num * block_size + self.tx_number
    }

    pub fn content(&self) -> &str {
        &self.proposed.content
    }
}
