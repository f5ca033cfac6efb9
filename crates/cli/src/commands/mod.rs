//! CLI commands module.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tledger_chain::{Ledger, LedgerConfig, RequestContext, DEFAULT_BLOCK_SIZE};
use tledger_core::Namespace;
use tledger_storage::SledStore;

mod block;
mod propose;
mod stats;
mod tx;

#[derive(Subcommand)]
pub enum Commands {
    /// Append a transaction
    Propose(propose::ProposeArgs),
    /// Block operations
    Block(block::BlockArgs),
    /// Transaction operations
    Tx(tx::TxArgs),
    /// Show namespace statistics
    Stats(stats::StatsArgs),
}

pub async fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Propose(args) => propose::run(args).await,
        Commands::Block(args) => block::run(args).await,
        Commands::Tx(args) => tx::run(args).await,
        Commands::Stats(args) => stats::run(args).await,
    }
}

/// Options shared by every command that opens the ledger.
#[derive(Args, Clone)]
pub struct LedgerArgs {
    /// Directory holding ledger data
    #[arg(short, long, default_value = "./tledger_data")]
    data_dir: PathBuf,

    /// Ledger namespace
    #[arg(short, long, default_value = "tledger")]
    namespace: String,

    /// Transactions per block
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,
}

/// An opened data directory.
pub struct OpenLedger {
    store: Arc<SledStore>,
    pub ledger: Ledger,
    pub ctx: RequestContext,
}

impl LedgerArgs {
    pub fn open(&self) -> Result<OpenLedger> {
        let namespace = Namespace::new(self.namespace.as_str())?;
        let store = Arc::new(
            SledStore::open(&self.data_dir)
                .with_context(|| format!("Failed to open data directory {:?}", self.data_dir))?,
        );
        let config = LedgerConfig {
            block_size: self.block_size,
            ..LedgerConfig::default()
        };
        let ledger = Ledger::new(store.clone(), config)?;
        let ctx = ledger.context(namespace);
        Ok(OpenLedger { store, ledger, ctx })
    }
}

impl OpenLedger {
    /// Flush pending writes to disk.
    pub fn close(self) -> Result<()> {
        self.store.flush().context("Failed to flush data directory")?;
        Ok(())
    }
}
