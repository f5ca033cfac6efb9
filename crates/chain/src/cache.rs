//! In-memory block cache.
//!
//! Committed blocks are immutable, so an entry never goes stale once
//! inserted. The cache only ever grows from block 0 upward; the one exception
//! is [`BlockCache::reset`], used when the store turns out to hold less than
//! previously observed.

use std::collections::BTreeMap;
use std::sync::Arc;
use tledger_core::Block;

/// Block number to block, for one namespace.
#[derive(Debug, Default)]
pub struct BlockCache {
    blocks: BTreeMap<u64, Arc<Block>>,
    /// Bumped every time the cache is discarded.
    generation: u64,
}

impl BlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached block.
    pub fn get(&self, block_num: u64) -> Option<Arc<Block>> {
        self.blocks.get(&block_num).cloned()
    }

    /// Highest cached block number, `None` when empty.
    pub fn highest_block_number(&self) -> Option<u64> {
        self.blocks.keys().next_back().copied()
    }

    /// The block number the next insert must carry.
    pub fn next_block_number(&self) -> u64 {
        self.highest_block_number().map_or(0, |n| n + 1)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cached blocks in ascending order.
    pub fn blocks(&self) -> impl Iterator<Item = &Arc<Block>> {
        self.blocks.values()
    }

    /// Append the next block. Returns `false` (and leaves the cache alone)
    /// if the block is not the immediate successor of the highest entry.
    pub(crate) fn insert(&mut self, block: Block) -> bool {
        if block.block_num != self.next_block_number() {
            return false;
        }
        self.blocks.insert(block.block_num, Arc::new(block));
        true
    }

    /// Drop every entry and start a new generation.
    pub(crate) fn reset(&mut self) {
        self.blocks.clear();
        self.generation += 1;
    }
}
