//! Coordination store clients for tledger.
//!
//! The ledger does not reach consensus itself. It delegates total order to a
//! linearizable key-value store offering ordered scans and an atomic
//! create-if-absent write, and this crate defines that contract:
//! - [`CoordinationStore`]: the async interface the ledger consumes
//! - [`MemoryStore`]: in-process store for tests and development
//! - [`SledStore`]: embedded persistent store for single-node deployments
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Ledger Layer                        │
//! │        (Sequencer, Reconciler, Block Cache)              │
//! └────────────────────────┬────────────────────────────────┘
//!                          │  get / get_prefix / get_range
//!                          │  put_if_absent
//! ┌────────────────────────▼────────────────────────────────┐
//! │                 CoordinationStore                        │
//! │   ┌───────────────┐          ┌───────────────────────┐   │
//! │   │  MemoryStore  │          │  SledStore            │   │
//! │   │  - BTreeMap   │          │  - compare_and_swap   │   │
//! │   │  - RwLock     │          │  - ordered scans      │   │
//! │   └───────────────┘          └───────────────────────┘   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use tledger_storage::{CoordinationStore, SledStore, SortOrder};
//!
//! # async fn run() -> tledger_storage::Result<()> {
//! let store = SledStore::open("./ledger_data")?;
//! let created = store.put_if_absent("main/0", b"{}".to_vec()).await?;
//! let latest = store.get_prefix("main/", SortOrder::Descend, 1).await?;
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod memory;
pub mod store;

// Re-export commonly used types
pub use db::SledStore;
pub use memory::MemoryStore;
pub use store::{CoordinationStore, KeyValue, Result, SortOrder, StoreError};
