//! Sequencing and block assembly for tledger.
//!
//! This crate turns a coordination store into an append-only ledger:
//! - **Sequencer**: optimistic, retrying allocation of gapless sequence indices
//! - **Reconciler**: syncing the local block cache with committed store state
//! - **Block cache**: immutable, hash-chained blocks served to readers
//! - **Ledger**: the service object tying these together per namespace
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tledger_chain::{Ledger, LedgerConfig};
//! use tledger_core::{Namespace, ProposedTransaction};
//! use tledger_storage::MemoryStore;
//!
//! # async fn run() -> tledger_chain::Result<()> {
//! let ledger = Ledger::new(Arc::new(MemoryStore::new()), LedgerConfig::default())?;
//! let ctx = ledger.context(Namespace::new("main")?);
//!
//! let proposal = ProposedTransaction::new("rent", vec!["ann".into()], vec![100]);
//! let sequenced = ledger.propose_transaction(&ctx, proposal).await?;
//! println!("block {} tx {}", sequenced.block_num, sequenced.tx_number);
//!
//! let block = ledger.get_block(&ctx, 0).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod ledger;
pub mod reconciler;
pub mod sequencer;

// Re-export commonly used types
pub use cache::BlockCache;
pub use config::{LedgerConfig, DEFAULT_BLOCK_SIZE, DEFAULT_STORE_TIMEOUT};
pub use context::RequestContext;
pub use error::{LedgerError, Result};
pub use ledger::Ledger;
pub use reconciler::{committed_blocks, ChainState, ChainStats, Reconciled, Reconciler};
pub use sequencer::{Sequenced, Sequencer};
