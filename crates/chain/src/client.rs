//! Deadline- and cancellation-aware access to the coordination store.

use crate::context::RequestContext;
use crate::error::{LedgerError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tledger_storage::{CoordinationStore, KeyValue, SortOrder};

/// Wraps a store handle so that every call carries the configured deadline
/// and is abandoned as soon as the request is cancelled.
#[derive(Clone)]
pub struct StoreClient {
    store: Arc<dyn CoordinationStore>,
    timeout: Duration,
}

impl StoreClient {
    pub fn new(store: Arc<dyn CoordinationStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn call<T, F>(&self, ctx: &RequestContext, op: F) -> Result<T>
    where
        F: Future<Output = tledger_storage::Result<T>>,
    {
        tokio::select! {
            biased;
            _ = ctx.cancellation.cancelled() => Err(LedgerError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, op) => match outcome {
                Ok(result) => result.map_err(LedgerError::from),
                Err(_) => Err(LedgerError::StoreTimeout(self.timeout)),
            },
        }
    }

    /// The entry with the greatest key in the request's namespace.
    pub async fn latest(&self, ctx: &RequestContext) -> Result<Option<KeyValue>> {
        let prefix = ctx.namespace.prefix();
        let mut entries = self
            .call(ctx, self.store.get_prefix(&prefix, SortOrder::Descend, 1))
            .await?;
        Ok(entries.pop())
    }

    /// Entries for sequence indices `first..=last` in the request's namespace.
    pub async fn index_range(
        &self,
        ctx: &RequestContext,
        first: u64,
        last: u64,
    ) -> Result<Vec<KeyValue>> {
        let first_key = ctx.namespace.key(first);
        let last_key = ctx.namespace.key(last);
        self.call(ctx, self.store.get_range(&first_key, &last_key))
            .await
    }

    /// Create the key for `index` unless it already exists.
    pub async fn claim(&self, ctx: &RequestContext, index: u64, value: Vec<u8>) -> Result<bool> {
        let key = ctx.namespace.key(index);
        self.call(ctx, self.store.put_if_absent(&key, value)).await
    }
}
