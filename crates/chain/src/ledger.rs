//! Main ledger orchestration.
//!
//! This module brings together the store client, the per-namespace chain
//! state, the reconciler and the sequencer behind the operations the route
//! layer calls.

use crate::client::StoreClient;
use crate::config::LedgerConfig;
use crate::context::RequestContext;
use crate::error::{LedgerError, Result};
use crate::reconciler::{ChainState, ChainStats, Reconciled, Reconciler};
use crate::sequencer::{Sequenced, Sequencer};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tledger_core::{Block, Namespace, ProposedTransaction, Transaction};
use tledger_storage::CoordinationStore;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// The ledger service. Construct once and share by reference (or `Arc`).
pub struct Ledger {
    client: StoreClient,
    config: LedgerConfig,
    chains: RwLock<HashMap<Namespace, Arc<ChainState>>>,
    shutdown: CancellationToken,
}

impl Ledger {
    /// Create a ledger over the given store.
    pub fn new(store: Arc<dyn CoordinationStore>, config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: StoreClient::new(store, config.store_timeout()),
            config,
            chains: RwLock::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// A request context for `namespace` that is cancelled on [`shutdown`](Self::shutdown).
    pub fn context(&self, namespace: Namespace) -> RequestContext {
        RequestContext::with_cancellation(namespace, self.shutdown.child_token())
    }

    /// Cancel every in-flight request created through [`context`](Self::context).
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    async fn chain(&self, namespace: &Namespace) -> Arc<ChainState> {
        if let Some(chain) = self.chains.read().await.get(namespace) {
            return chain.clone();
        }
        self.chains
            .write()
            .await
            .entry(namespace.clone())
            .or_default()
            .clone()
    }

    /// Assign the proposal the next sequence index in the context's namespace.
    pub async fn propose_transaction(
        &self,
        ctx: &RequestContext,
        proposed: ProposedTransaction,
    ) -> Result<Sequenced> {
        let chain = self.chain(&ctx.namespace).await;
        Sequencer::new(&self.client, &self.config)
            .propose(ctx, &chain, proposed)
            .await
    }

    /// Get a committed block, reconciling once on a cache miss.
    pub async fn get_block(&self, ctx: &RequestContext, block_num: u64) -> Result<Option<Arc<Block>>> {
        let chain = self.chain(&ctx.namespace).await;
        if let Some(block) = chain.cached_block(block_num).await {
            return Ok(Some(block));
        }
        Reconciler::new(&self.client, self.config.block_size)
            .reconcile(ctx, &chain)
            .await?;
        Ok(chain.cached_block(block_num).await)
    }

    /// Get a transaction from a committed block.
    ///
    /// Transactions in a block that is not yet full are not visible here.
    pub async fn get_transaction(
        &self,
        ctx: &RequestContext,
        block_num: u64,
        tx_number: u64,
    ) -> Result<Option<Transaction>> {
        if tx_number >= self.config.block_size_u64() {
            return Err(LedgerError::TransactionOutOfRange {
                tx_number,
                block_size: self.config.block_size,
            });
        }
        let block = self.get_block(ctx, block_num).await?;
        Ok(block.and_then(|b| b.transaction(tx_number).cloned()))
    }

    /// Sync the context's namespace with the store.
    pub async fn reconcile(&self, ctx: &RequestContext) -> Result<Reconciled> {
        let chain = self.chain(&ctx.namespace).await;
        Reconciler::new(&self.client, self.config.block_size)
            .reconcile(ctx, &chain)
            .await
    }

    /// Local view of a namespace, without touching the store.
    ///
    /// Namespaces this ledger has never served report empty stats and are
    /// not registered.
    pub async fn stats(&self, namespace: &Namespace) -> ChainStats {
        let chain = self.chains.read().await.get(namespace).cloned();
        match chain {
            Some(chain) => chain.stats().await,
            None => ChainStats::default(),
        }
    }

    /// Every cached block of every namespace seen so far.
    pub async fn snapshot(&self) -> BTreeMap<Namespace, Vec<Arc<Block>>> {
        let chains: Vec<_> = self
            .chains
            .read()
            .await
            .iter()
            .map(|(ns, chain)| (ns.clone(), chain.clone()))
            .collect();

        let mut snapshot = BTreeMap::new();
        for (namespace, chain) in chains {
            snapshot.insert(namespace, chain.blocks().await);
        }
        snapshot
    }
}
