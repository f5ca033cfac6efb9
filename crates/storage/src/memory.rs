use crate::store::{CoordinationStore, KeyValue, Result, SortOrder};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;

/// In-process coordination store.
///
/// Linearizable within one process: every operation takes the map lock, so a
/// conditional write and the existence check it depends on happen atomically.
/// Used by tests and single-node development servers.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally write a key, bypassing the ledger protocol.
    ///
    /// Stands in for out-of-band writers when exercising reconciliation.
    pub async fn put(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.data.write().await.insert(key.into(), value.into());
    }

    /// Remove a key, bypassing the ledger protocol.
    pub async fn delete(&self, key: &str) -> Option<Vec<u8>> {
        self.data.write().await.remove(key)
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl CoordinationStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn get_prefix(
        &self,
        prefix: &str,
        order: SortOrder,
        limit: usize,
    ) -> Result<Vec<KeyValue>> {
        let data = self.data.read().await;
        let end = prefix_end(prefix);
        let upper = match &end {
            Some(end) => Bound::Excluded(end.as_str()),
            None => Bound::Unbounded,
        };
        let matching = data
            .range::<str, _>((Bound::Included(prefix), upper))
            .map(|(k, v)| KeyValue::new(k.clone(), v.clone()));

        let results = match order {
            SortOrder::Ascend => matching.take(limit).collect(),
            SortOrder::Descend => matching.rev().take(limit).collect(),
        };
        Ok(results)
    }

    async fn get_range(&self, first: &str, last: &str) -> Result<Vec<KeyValue>> {
        if first > last {
            return Ok(Vec::new());
        }
        let data = self.data.read().await;
        Ok(data
            .range::<str, _>((Bound::Included(first), Bound::Included(last)))
            .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
            .collect())
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        let mut data = self.data.write().await;
        if data.contains_key(key) {
            return Ok(false);
        }
        data.insert(key.to_string(), value);
        Ok(true)
    }
}

/// Smallest string greater than every string starting with `prefix`.
///
/// `None` when no such string exists (empty prefix, or only `char::MAX`).
fn prefix_end(prefix: &str) -> Option<String> {
    let mut end = prefix.to_string();
    while let Some(last) = end.pop() {
        // char::from_u32 rejects surrogates, so step over that gap
        let next = (u32::from(last) + 1..=u32::from(char::MAX)).find_map(char::from_u32);
        if let Some(next) = next {
            end.push(next);
            return Some(end);
        }
    }
    None
}
