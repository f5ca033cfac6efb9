//! Ledger errors.

use std::time::Duration;
use thiserror::Error;
use tledger_core::{BlockError, CodecError};
use tledger_storage::StoreError;

/// Errors that can occur during ledger operations.
///
/// Losing a conditional write to another proposer is not listed here; the
/// sequencer retries it internally.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("coordination store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("coordination store did not answer within {0:?}")]
    StoreTimeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    #[error("malformed sequence index in key {0:?}")]
    MalformedIndex(String),

    #[error("invalid namespace: {0:?}")]
    InvalidNamespace(String),

    #[error("block needs exactly {expected} transactions, got {actual}")]
    WrongTransactionCount { expected: usize, actual: usize },

    #[error("block {block_num} is committed but the store returned {found} of {expected} transactions")]
    IncompleteBlockRange {
        block_num: u64,
        expected: usize,
        found: usize,
    },

    #[error("block {block_num} does not follow the cache, expected block {expected}")]
    NonContiguousBlock { block_num: u64, expected: u64 },

    #[error("gave up after {attempts} contended attempts")]
    TooManyRetries { attempts: u32 },

    #[error("transaction number {tx_number} out of range for block size {block_size}")]
    TransactionOutOfRange { tx_number: u64, block_size: usize },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LedgerError {
    /// Whether the caller may resubmit the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::StoreUnavailable(_) | LedgerError::StoreTimeout(_)
        )
    }
}

impl From<CodecError> for LedgerError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::MalformedIndex(key) => LedgerError::MalformedIndex(key),
            CodecError::InvalidNamespace(ns) => LedgerError::InvalidNamespace(ns),
        }
    }
}

impl From<BlockError> for LedgerError {
    fn from(err: BlockError) -> Self {
        match err {
            BlockError::WrongTransactionCount { expected, actual } => {
                LedgerError::WrongTransactionCount { expected, actual }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
