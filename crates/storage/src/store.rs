//! The coordination store interface.

use async_trait::async_trait;
use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("coordination store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sled::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Direction of a prefix scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascend,
    Descend,
}

/// A key and its raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A linearizable key-value store with ordered scans and create-if-absent.
///
/// The ledger never locks anything in the store itself. Uniqueness of
/// sequence indices rests entirely on [`put_if_absent`](Self::put_if_absent)
/// being atomic across every client of the store.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Get a value by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Keys starting with `prefix`, sorted by key in `order`, at most `limit` entries.
    async fn get_prefix(&self, prefix: &str, order: SortOrder, limit: usize)
        -> Result<Vec<KeyValue>>;

    /// Keys in `[first, last]`, ascending.
    async fn get_range(&self, first: &str, last: &str) -> Result<Vec<KeyValue>>;

    /// Create `key` only if it does not exist yet.
    ///
    /// Returns `false` when another writer got there first; that is not an error.
    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool>;
}
