//! Fixed-size, hash-chained blocks.

use crate::hash::{empty_as_none, hash, Hash};
use crate::transaction::Transaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while assembling a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("block needs exactly {expected} transactions, got {actual}")]
    WrongTransactionCount { expected: usize, actual: usize },
}

/// An immutable group of `block_size` consecutively sequenced transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block number (0 for the first block).
    pub block_num: u64,
    /// Timestamp of the last transaction in the block.
    pub timestamp: DateTime<Utc>,
    /// Hash of the previous block, absent for block 0.
    #[serde(with = "empty_as_none")]
    pub previous_hash: Option<Hash>,
    /// Content hash over every other field.
    pub hash: Hash,
    /// Transactions in in-block order.
    pub transactions: Vec<Transaction>,
}

/// The fields covered by the content hash, in hashing order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HashedFields<'a> {
    block_num: u64,
    timestamp: &'a DateTime<Utc>,
    previous_hash: String,
    transactions: &'a [Transaction],
}

impl Block {
    /// Build a block from exactly `block_size` transactions.
    ///
    /// Transactions must already be in in-block order; they are not sorted.
    pub fn assemble(
        block_num: u64,
        previous_hash: Option<Hash>,
        transactions: Vec<Transaction>,
        block_size: usize,
    ) -> Result<Self, BlockError> {
        let wrong_count = BlockError::WrongTransactionCount {
            expected: block_size,
            actual: transactions.len(),
        };
        if transactions.len() != block_size {
            return Err(wrong_count);
        }
        let timestamp = match transactions.last() {
            Some(last) => last.timestamp,
            None => return Err(wrong_count),
        };

        let mut block = Self {
            block_num,
            timestamp,
            previous_hash,
            hash: Hash::ZERO,
            transactions,
        };
        block.hash = block.compute_hash();
        Ok(block)
    }

    /// Digest over the canonical JSON rendering of every field except `hash`.
    pub fn compute_hash(&self) -> Hash {
        let fields = HashedFields {
            block_num: self.block_num,
            timestamp: &self.timestamp,
            previous_hash: self
                .previous_hash
                .map(|h| h.to_hex())
                .unwrap_or_default(),
            transactions: &self.transactions,
        };
        let encoded = serde_json::to_vec(&fields).expect("serialization should not fail");
        hash(&encoded)
    }

    /// Check the stored hash against the block's contents.
    pub fn verify_hash(&self) -> bool {
        self.compute_hash() == self.hash
    }

    /// Check that this block directly follows `parent`.
    pub fn follows(&self, parent: &Block) -> bool {
        self.block_num == parent.block_num + 1 && self.previous_hash == Some(parent.hash)
    }

    /// Get a transaction by in-block position.
    pub fn transaction(&self, tx_number: u64) -> Option<&Transaction> {
        usize::try_from(tx_number)
            .ok()
            .and_then(|i| self.transactions.get(i))
    }

    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}
