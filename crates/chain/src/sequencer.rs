//! Sequence index allocation.
//!
//! Each attempt reconciles to learn the latest index `L`, then tries to create
//! the key for `L + 1`. The store's create-if-absent is the linearization
//! point: exactly one proposer wins each index, and losers observe the
//! winner on their next reconciliation and move on to the following index.
//! Because every writer only ever targets "latest + 1", indices stay gapless.

use crate::client::StoreClient;
use crate::config::LedgerConfig;
use crate::context::RequestContext;
use crate::error::{LedgerError, Result};
use crate::reconciler::{ChainState, Reconciler};
use chrono::Utc;
use tledger_core::{ProposedTransaction, Transaction};
use tracing::{debug, info};

/// A proposal that won its index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequenced {
    /// Global sequence index.
    pub index: u64,
    pub block_num: u64,
    pub tx_number: u64,
    /// The value that was written to the store.
    pub transaction: Transaction,
    /// Attempts taken, including the successful one.
    pub attempts: u32,
}

/// Allocates sequence indices for proposals.
pub struct Sequencer<'a> {
    client: &'a StoreClient,
    config: &'a LedgerConfig,
}

impl<'a> Sequencer<'a> {
    pub fn new(client: &'a StoreClient, config: &'a LedgerConfig) -> Self {
        Self { client, config }
    }

    pub async fn propose(
        &self,
        ctx: &RequestContext,
        state: &ChainState,
        proposed: ProposedTransaction,
    ) -> Result<Sequenced> {
        let reconciler = Reconciler::new(self.client, self.config.block_size);
        let block_size = self.config.block_size_u64();

        for attempt in 1..=self.config.max_attempts {
            let latest = reconciler.reconcile(ctx, state).await?.latest_index;
            let index = latest.map_or(0, |l| l.saturating_add(1));

            let transaction = Transaction::sequenced(proposed.clone(), index, block_size, Utc::now());
            let value = serde_json::to_vec(&transaction)?;

            if self.client.claim(ctx, index, value).await? {
                state.advance_latest(index).await;
                info!(
                    namespace = %ctx.namespace,
                    index,
                    block_num = transaction.block_num,
                    tx_number = transaction.tx_number,
                    attempt,
                    "transaction sequenced"
                );
                return Ok(Sequenced {
                    index,
                    block_num: transaction.block_num,
                    tx_number: transaction.tx_number,
                    transaction,
                    attempts: attempt,
                });
            }

            debug!(namespace = %ctx.namespace, index, attempt, "lost race for index");
            if attempt < self.config.max_attempts {
                self.back_off(ctx, attempt).await?;
            }
        }

        Err(LedgerError::TooManyRetries {
            attempts: self.config.max_attempts,
        })
    }

    async fn back_off(&self, ctx: &RequestContext, attempt: u32) -> Result<()> {
        let delay = self.config.backoff(attempt);
        if delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = ctx.cancellation.cancelled() => Err(LedgerError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}
