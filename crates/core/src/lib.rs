//! Core ledger primitives for tledger.
//!
//! This crate provides the fundamental types used throughout the ledger:
//! - Sequence index keys (fixed-width binary codec, namespaces)
//! - Content hashing
//! - Proposed and sequenced transactions
//! - Fixed-size, hash-chained blocks

pub mod block;
pub mod codec;
pub mod hash;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{Block, BlockError};
pub use codec::{decode, encode, CodecError, Namespace};
pub use hash::{hash, Hash, H256};
pub use transaction::{ProposedTransaction, Transaction};
