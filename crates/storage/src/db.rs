//! sled-backed coordination store.

use crate::store::{CoordinationStore, KeyValue, Result, SortOrder};
use async_trait::async_trait;
use sled::Db;
use std::path::Path;

/// Coordination store on an embedded sled database.
///
/// sled's `compare_and_swap` gives the create-if-absent guarantee for every
/// handle sharing this database. A sled directory can only be opened by one
/// process at a time, so this backend serves single-node deployments.
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing).
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn key_value(entry: sled::Result<(sled::IVec, sled::IVec)>) -> Result<KeyValue> {
        let (key, value) = entry?;
        // Non-UTF-8 keys are kept visible so the caller's decode rejects them.
        Ok(KeyValue::new(
            String::from_utf8_lossy(&key).into_owned(),
            value.to_vec(),
        ))
    }
}

#[async_trait]
impl CoordinationStore for SledStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    async fn get_prefix(
        &self,
        prefix: &str,
        order: SortOrder,
        limit: usize,
    ) -> Result<Vec<KeyValue>> {
        let iter = self.db.scan_prefix(prefix);
        match order {
            SortOrder::Ascend => iter.take(limit).map(Self::key_value).collect(),
            SortOrder::Descend => iter.rev().take(limit).map(Self::key_value).collect(),
        }
    }

    async fn get_range(&self, first: &str, last: &str) -> Result<Vec<KeyValue>> {
        if first > last {
            return Ok(Vec::new());
        }
        self.db
            .range(first.as_bytes()..=last.as_bytes())
            .map(Self::key_value)
            .collect()
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        let swapped = self
            .db
            .compare_and_swap(key, None as Option<&[u8]>, Some(value))?;
        Ok(swapped.is_ok())
    }
}
