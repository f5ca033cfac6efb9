//! Bringing the local cache up to date with the coordination store.
//!
//! A block is only materialized once every index in its range is known to
//! exist. Since indices are allocated gaplessly, "latest index is L" implies
//! indices `0..=L` all exist, so `(L + 1) / block_size` blocks are complete.

use crate::cache::BlockCache;
use crate::client::StoreClient;
use crate::context::RequestContext;
use crate::error::{LedgerError, Result};
use std::sync::Arc;
use tledger_core::{Block, Hash, Transaction};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Everything the ledger tracks for one namespace.
///
/// `latest_index` doubles as the reconciliation lock: it is held for the
/// whole of a pass, so passes never interleave. The cache has its own lock so
/// that readers of already-cached blocks never wait on store round trips.
#[derive(Debug, Default)]
pub struct ChainState {
    latest_index: Mutex<Option<u64>>,
    cache: RwLock<BlockCache>,
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn cached_block(&self, block_num: u64) -> Option<Arc<Block>> {
        self.cache.read().await.get(block_num)
    }

    /// Latest sequence index as of the last completed pass.
    pub async fn latest_index(&self) -> Option<u64> {
        *self.latest_index.lock().await
    }

    /// Record an index this process just claimed, without a store round trip.
    pub(crate) async fn advance_latest(&self, index: u64) {
        let mut latest = self.latest_index.lock().await;
        if latest.map_or(true, |l| l < index) {
            *latest = Some(index);
        }
    }

    /// Append the successor of the highest cached block.
    pub(crate) async fn append(&self, block: Block) -> Result<()> {
        let mut cache = self.cache.write().await;
        let expected = cache.next_block_number();
        let block_num = block.block_num;
        if !cache.insert(block) {
            return Err(LedgerError::NonContiguousBlock {
                block_num,
                expected,
            });
        }
        Ok(())
    }

    pub async fn stats(&self) -> ChainStats {
        let latest_index = self.latest_index().await;
        let cache = self.cache.read().await;
        ChainStats {
            latest_index,
            cached_blocks: cache.len(),
            highest_cached_block: cache.highest_block_number(),
            generation: cache.generation(),
        }
    }

    /// Every cached block, ascending.
    pub async fn blocks(&self) -> Vec<Arc<Block>> {
        self.cache.read().await.blocks().cloned().collect()
    }
}

/// Point-in-time summary of one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainStats {
    pub latest_index: Option<u64>,
    pub cached_blocks: usize,
    pub highest_cached_block: Option<u64>,
    pub generation: u64,
}

/// What one reconciliation pass observed and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Latest sequence index in the store, `None` if the namespace is empty.
    pub latest_index: Option<u64>,
    /// Number of blocks whose full index range exists.
    pub committed_blocks: u64,
    /// Blocks assembled and cached during this pass.
    pub new_blocks: usize,
    /// Whether the cache was discarded before rebuilding.
    pub reset: bool,
}

/// Number of complete blocks given the latest index.
///
/// Saturates at `u64::MAX`: with a block size of 1 and the very last index
/// taken, the final block number would not fit in a `u64`.
pub fn committed_blocks(latest_index: Option<u64>, block_size: u64) -> u64 {
    match latest_index {
        None => 0,
        Some(latest) => {
            let count = (u128::from(latest) + 1) / u128::from(block_size);
            u64::try_from(count).unwrap_or(u64::MAX)
        }
    }
}

/// Syncs a namespace's [`ChainState`] with the store.
pub struct Reconciler<'a> {
    client: &'a StoreClient,
    block_size: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a StoreClient, block_size: usize) -> Self {
        Self { client, block_size }
    }

    pub async fn reconcile(&self, ctx: &RequestContext, state: &ChainState) -> Result<Reconciled> {
        let mut latest = state.latest_index.lock().await;
        let namespace = &ctx.namespace;
        let block_size = self.block_size as u64;

        let observed = match self.client.latest(ctx).await? {
            Some(entry) => Some(namespace.index_of(&entry.key)?),
            None => None,
        };
        let committed = committed_blocks(observed, block_size);

        let went_backwards = match (*latest, observed) {
            (Some(previous), Some(now)) => now < previous,
            (Some(_), None) => true,
            (None, _) => false,
        };
        let mut reset = false;
        {
            let mut cache = state.cache.write().await;
            if went_backwards || cache.next_block_number() > committed {
                warn!(
                    namespace = %namespace,
                    previous = ?*latest,
                    observed = ?observed,
                    discarded = cache.len(),
                    "store holds less than previously observed, rebuilding block cache"
                );
                cache.reset();
                reset = true;
            }
        }
        *latest = observed;

        let (start, mut previous_hash) = {
            let cache = state.cache.read().await;
            let next = cache.next_block_number();
            let previous = next
                .checked_sub(1)
                .and_then(|n| cache.get(n))
                .map(|b| b.hash);
            (next, previous)
        };

        let mut new_blocks = 0;
        for block_num in start..committed {
            let block = self.fetch_block(ctx, block_num, previous_hash).await?;
            info!(
                namespace = %namespace,
                block_num,
                hash = %block.hash,
                "cached committed block"
            );
            previous_hash = Some(block.hash);
            state.append(block).await?;
            new_blocks += 1;
        }

        debug!(
            namespace = %namespace,
            latest_index = ?observed,
            committed_blocks = committed,
            new_blocks,
            "reconciled"
        );

        Ok(Reconciled {
            latest_index: observed,
            committed_blocks: committed,
            new_blocks,
            reset,
        })
    }

    /// Read one committed block's transactions and assemble it.
    async fn fetch_block(
        &self,
        ctx: &RequestContext,
        block_num: u64,
        previous_hash: Option<Hash>,
    ) -> Result<Block> {
        let block_size = self.block_size as u64;
        let first = block_num * block_size;
        let last = first + block_size - 1;

        let entries = self.client.index_range(ctx, first, last).await?;
        let incomplete = |found: usize| LedgerError::IncompleteBlockRange {
            block_num,
            expected: self.block_size,
            found,
        };
        if entries.len() != self.block_size {
            return Err(incomplete(entries.len()));
        }

        let mut transactions = Vec::with_capacity(self.block_size);
        for (expected, entry) in (first..=last).zip(&entries) {
            if ctx.namespace.index_of(&entry.key)? != expected {
                return Err(incomplete(transactions.len()));
            }
            transactions.push(serde_json::from_slice::<Transaction>(&entry.value)?);
        }

        Ok(Block::assemble(
            block_num,
            previous_hash,
            transactions,
            self.block_size,
        )?)
    }
}
