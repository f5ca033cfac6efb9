use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tledger_chain::{Ledger, LedgerConfig, LedgerError, RequestContext};
use tledger_core::{Namespace, ProposedTransaction, Transaction};
use tledger_storage::{
    CoordinationStore, KeyValue, MemoryStore, SledStore, SortOrder, StoreError,
};
use tokio_util::sync::CancellationToken;

fn namespace() -> Namespace {
    Namespace::new("testledger").unwrap()
}

fn proposal(content: impl Into<String>) -> ProposedTransaction {
    ProposedTransaction::new(content, vec!["ann".into(), "bo".into()], vec![50, 50])
}

fn memory_ledger(config: LedgerConfig) -> (Arc<MemoryStore>, Ledger) {
    let store = Arc::new(MemoryStore::new());
    let ledger = Ledger::new(store.clone(), config).unwrap();
    (store, ledger)
}

/// Writes a transaction the way another ledger process would.
async fn external_commit(store: &MemoryStore, ns: &Namespace, index: u64, content: &str) {
    let tx = Transaction::sequenced(proposal(content), index, 3, Utc::now());
    store
        .put(ns.key(index), serde_json::to_vec(&tx).unwrap())
        .await;
}

/// Lets a competing writer claim the target key just before our first write.
struct RacingStore {
    inner: MemoryStore,
    raced: AtomicBool,
}

#[async_trait]
impl CoordinationStore for RacingStore {
    async fn get(&self, key: &str) -> tledger_storage::Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn get_prefix(
        &self,
        prefix: &str,
        order: SortOrder,
        limit: usize,
    ) -> tledger_storage::Result<Vec<KeyValue>> {
        self.inner.get_prefix(prefix, order, limit).await
    }

    async fn get_range(&self, first: &str, last: &str) -> tledger_storage::Result<Vec<KeyValue>> {
        self.inner.get_range(first, last).await
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> tledger_storage::Result<bool> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            let rival = Transaction::sequenced(proposal("rival"), 0, 3, Utc::now());
            let won = self
                .inner
                .put_if_absent(key, serde_json::to_vec(&rival).unwrap())
                .await?;
            assert!(won);
        }
        self.inner.put_if_absent(key, value).await
    }
}

/// Rejects every conditional write, as under unending contention.
#[derive(Default)]
struct ContendedStore {
    inner: MemoryStore,
    claims: AtomicU32,
}

#[async_trait]
impl CoordinationStore for ContendedStore {
    async fn get(&self, key: &str) -> tledger_storage::Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn get_prefix(
        &self,
        prefix: &str,
        order: SortOrder,
        limit: usize,
    ) -> tledger_storage::Result<Vec<KeyValue>> {
        self.inner.get_prefix(prefix, order, limit).await
    }

    async fn get_range(&self, first: &str, last: &str) -> tledger_storage::Result<Vec<KeyValue>> {
        self.inner.get_range(first, last).await
    }

    async fn put_if_absent(&self, _key: &str, _value: Vec<u8>) -> tledger_storage::Result<bool> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(false)
    }
}

/// Either fails fast or never answers.
enum BrokenStore {
    Down,
    Hanging,
}

impl BrokenStore {
    async fn fail<T: Send>(&self) -> tledger_storage::Result<T> {
        match self {
            BrokenStore::Down => Err(StoreError::Unavailable("connection refused".into())),
            BrokenStore::Hanging => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(StoreError::Unavailable("unreachable".into()))
            }
        }
    }
}

#[async_trait]
impl CoordinationStore for BrokenStore {
    async fn get(&self, _key: &str) -> tledger_storage::Result<Option<Vec<u8>>> {
        self.fail().await
    }

    async fn get_prefix(
        &self,
        _prefix: &str,
        _order: SortOrder,
        _limit: usize,
    ) -> tledger_storage::Result<Vec<KeyValue>> {
        self.fail().await
    }

    async fn get_range(&self, _first: &str, _last: &str) -> tledger_storage::Result<Vec<KeyValue>> {
        self.fail().await
    }

    async fn put_if_absent(&self, _key: &str, _value: Vec<u8>) -> tledger_storage::Result<bool> {
        self.fail().await
    }
}

/// Serves reads normally but breaks on the conditional write.
struct BrokenWrites {
    inner: MemoryStore,
    writes: BrokenStore,
}

#[async_trait]
impl CoordinationStore for BrokenWrites {
    async fn get(&self, key: &str) -> tledger_storage::Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn get_prefix(
        &self,
        prefix: &str,
        order: SortOrder,
        limit: usize,
    ) -> tledger_storage::Result<Vec<KeyValue>> {
        self.inner.get_prefix(prefix, order, limit).await
    }

    async fn get_range(&self, first: &str, last: &str) -> tledger_storage::Result<Vec<KeyValue>> {
        self.inner.get_range(first, last).await
    }

    async fn put_if_absent(&self, _key: &str, _value: Vec<u8>) -> tledger_storage::Result<bool> {
        self.writes.fail().await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_proposals_are_gapless() {
    const N: u64 = 24;
    let config = LedgerConfig {
        max_attempts: 1_000,
        initial_backoff_ms: 0,
        ..LedgerConfig::default()
    };
    let (_store, ledger) = memory_ledger(config);
    let ledger = Arc::new(ledger);

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                let ctx = ledger.context(namespace());
                ledger
                    .propose_transaction(&ctx, proposal(format!("tx-{i}")))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut indices = BTreeSet::new();
    for handle in handles {
        let sequenced = handle.await.unwrap();
        assert_eq!(sequenced.block_num, sequenced.index / 3);
        assert_eq!(sequenced.tx_number, sequenced.index % 3);
        assert!(indices.insert(sequenced.index), "duplicate index");
    }
    assert_eq!(indices, (0..N).collect::<BTreeSet<_>>());

    let ctx = ledger.context(namespace());
    ledger.reconcile(&ctx).await.unwrap();
    assert_eq!(ledger.stats(&namespace()).await.cached_blocks, (N / 3) as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_ledgers_sharing_a_store() {
    let store = Arc::new(MemoryStore::new());
    let config = LedgerConfig {
        max_attempts: 1_000,
        ..LedgerConfig::default()
    };
    let a = Arc::new(Ledger::new(store.clone(), config.clone()).unwrap());
    let b = Arc::new(Ledger::new(store.clone(), config).unwrap());

    let mut handles = Vec::new();
    for i in 0..10 {
        for ledger in [a.clone(), b.clone()] {
            handles.push(tokio::spawn(async move {
                let ctx = ledger.context(namespace());
                ledger
                    .propose_transaction(&ctx, proposal(format!("{i}")))
                    .await
                    .unwrap()
                    .index
            }));
        }
    }

    let mut indices = BTreeSet::new();
    for handle in handles {
        indices.insert(handle.await.unwrap());
    }
    assert_eq!(indices, (0..20).collect::<BTreeSet<_>>());

    // Both processes assemble the identical chain
    let ctx_a = a.context(namespace());
    let ctx_b = b.context(namespace());
    for n in 0..6 {
        let from_a = a.get_block(&ctx_a, n).await.unwrap().unwrap();
        let from_b = b.get_block(&ctx_b, n).await.unwrap().unwrap();
        assert_eq!(from_a.hash, from_b.hash);
    }
}

#[tokio::test]
async fn test_racing_writer_pushes_loser_to_next_index() {
    let store = Arc::new(RacingStore {
        inner: MemoryStore::new(),
        raced: AtomicBool::new(false),
    });
    let ledger = Ledger::new(store.clone(), LedgerConfig::default()).unwrap();
    let ctx = ledger.context(namespace());

    let sequenced = ledger
        .propose_transaction(&ctx, proposal("mine"))
        .await
        .unwrap();

    assert_eq!(sequenced.index, 1);
    assert_eq!(sequenced.attempts, 2);

    let winner = store.get(&namespace().key(0)).await.unwrap().unwrap();
    let winner: Transaction = serde_json::from_slice(&winner).unwrap();
    assert_eq!(winner.content(), "rival");
}

#[tokio::test]
async fn test_seven_transactions_leave_one_pending() {
    let (store, ledger) = memory_ledger(LedgerConfig::default());
    let ns = namespace();
    for i in 0..7 {
        external_commit(&store, &ns, i, &format!("tx-{i}")).await;
    }
    let ctx = ledger.context(ns.clone());

    let outcome = ledger.reconcile(&ctx).await.unwrap();
    assert_eq!(outcome.latest_index, Some(6));
    assert_eq!(outcome.new_blocks, 2);

    let b0 = ledger.get_block(&ctx, 0).await.unwrap().unwrap();
    let b1 = ledger.get_block(&ctx, 1).await.unwrap().unwrap();
    let contents: Vec<_> = b0
        .transactions
        .iter()
        .chain(&b1.transactions)
        .map(|tx| tx.content().to_string())
        .collect();
    assert_eq!(contents, vec!["tx-0", "tx-1", "tx-2", "tx-3", "tx-4", "tx-5"]);

    // Index 6 waits for two more transactions
    assert!(ledger.get_block(&ctx, 2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_block_past_the_end_stays_absent() {
    let (_store, ledger) = memory_ledger(LedgerConfig::default());
    let ctx = ledger.context(namespace());
    for i in 0..3 {
        ledger
            .propose_transaction(&ctx, proposal(format!("{i}")))
            .await
            .unwrap();
    }

    assert!(ledger.get_block(&ctx, 1).await.unwrap().is_none());
    ledger.reconcile(&ctx).await.unwrap();
    assert!(ledger.get_block(&ctx, 1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let (store, ledger) = memory_ledger(LedgerConfig::default());
    let ns = namespace();
    for i in 0..8 {
        external_commit(&store, &ns, i, "x").await;
    }
    let ctx = ledger.context(ns.clone());

    let first = ledger.reconcile(&ctx).await.unwrap();
    let stats_after_first = ledger.stats(&ns).await;
    let snapshot_after_first = ledger.snapshot().await;

    let second = ledger.reconcile(&ctx).await.unwrap();
    assert_eq!(second.new_blocks, 0);
    assert!(!second.reset);
    assert_eq!(second.latest_index, first.latest_index);
    assert_eq!(ledger.stats(&ns).await, stats_after_first);
    assert_eq!(ledger.snapshot().await, snapshot_after_first);
}

#[tokio::test]
async fn test_hash_chain_links_every_block() {
    let (_store, ledger) = memory_ledger(LedgerConfig::default());
    let ctx = ledger.context(namespace());
    for i in 0..15 {
        ledger
            .propose_transaction(&ctx, proposal(format!("{i}")))
            .await
            .unwrap();
    }

    let b0 = ledger.get_block(&ctx, 0).await.unwrap().unwrap();
    assert!(b0.previous_hash.is_none());
    let mut parent = b0;
    for n in 1..5 {
        let block = ledger.get_block(&ctx, n).await.unwrap().unwrap();
        assert!(block.verify_hash());
        assert!(block.follows(&parent));
        assert_eq!(block.previous_hash, Some(parent.hash));
        assert_eq!(block.timestamp, block.transactions[2].timestamp);
        parent = block;
    }
}

#[tokio::test]
async fn test_external_writes_are_observed() {
    let (store, ledger) = memory_ledger(LedgerConfig::default());
    let ns = namespace();
    let ctx = ledger.context(ns.clone());

    ledger.propose_transaction(&ctx, proposal("ours")).await.unwrap();
    external_commit(&store, &ns, 1, "theirs").await;

    let sequenced = ledger.propose_transaction(&ctx, proposal("ours again")).await.unwrap();
    assert_eq!(sequenced.index, 2);

    let block = ledger.get_block(&ctx, 0).await.unwrap().unwrap();
    assert_eq!(block.transactions[1].content(), "theirs");
}

#[tokio::test]
async fn test_unending_contention_gives_up() {
    let store = Arc::new(ContendedStore::default());
    let config = LedgerConfig {
        max_attempts: 5,
        initial_backoff_ms: 1,
        max_backoff_ms: 2,
        ..LedgerConfig::default()
    };
    let ledger = Ledger::new(store.clone(), config).unwrap();
    let ctx = ledger.context(namespace());

    let result = ledger.propose_transaction(&ctx, proposal("never")).await;
    assert!(matches!(result, Err(LedgerError::TooManyRetries { attempts: 5 })));
    assert_eq!(store.claims.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_store_down_aborts_without_retry() {
    let ledger = Ledger::new(Arc::new(BrokenStore::Down), LedgerConfig::default()).unwrap();
    let ctx = ledger.context(namespace());

    let err = ledger
        .propose_transaction(&ctx, proposal("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::StoreUnavailable(_)));
    assert!(err.is_retryable());

    let err = ledger.get_block(&ctx, 0).await.unwrap_err();
    assert!(matches!(err, LedgerError::StoreUnavailable(_)));
}

#[tokio::test]
async fn test_hanging_store_times_out() {
    let config = LedgerConfig {
        store_timeout_ms: 50,
        ..LedgerConfig::default()
    };
    let ledger = Ledger::new(Arc::new(BrokenStore::Hanging), config).unwrap();
    let ctx = ledger.context(namespace());

    let err = ledger.reconcile(&ctx).await.unwrap_err();
    assert!(matches!(err, LedgerError::StoreTimeout(d) if d == Duration::from_millis(50)));
}

#[tokio::test]
async fn test_cancellation_interrupts_pending_call() {
    let config = LedgerConfig {
        store_timeout_ms: 60_000,
        ..LedgerConfig::default()
    };
    let ledger = Ledger::new(Arc::new(BrokenStore::Hanging), config).unwrap();
    let token = CancellationToken::new();
    let ctx = RequestContext::with_cancellation(namespace(), token.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let err = ledger
        .propose_transaction(&ctx, proposal("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Cancelled));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_failed_claim_aborts_without_retry() {
    let store = Arc::new(BrokenWrites {
        inner: MemoryStore::new(),
        writes: BrokenStore::Down,
    });
    let ledger = Ledger::new(store.clone(), LedgerConfig::default()).unwrap();
    let ctx = ledger.context(namespace());

    let err = ledger
        .propose_transaction(&ctx, proposal("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::StoreUnavailable(_)));
    assert!(store.inner.is_empty().await);
    assert_eq!(ledger.stats(&namespace()).await.latest_index, None);
}

#[tokio::test]
async fn test_hanging_claim_times_out() {
    let store = Arc::new(BrokenWrites {
        inner: MemoryStore::new(),
        writes: BrokenStore::Hanging,
    });
    let config = LedgerConfig {
        store_timeout_ms: 50,
        ..LedgerConfig::default()
    };
    let ledger = Ledger::new(store, config).unwrap();
    let ctx = ledger.context(namespace());

    let err = ledger
        .propose_transaction(&ctx, proposal("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::StoreTimeout(d) if d == Duration::from_millis(50)));
}

#[tokio::test]
async fn test_cancellation_interrupts_backoff() {
    let store = Arc::new(ContendedStore::default());
    let config = LedgerConfig {
        max_attempts: 10,
        initial_backoff_ms: 60_000,
        max_backoff_ms: 60_000,
        ..LedgerConfig::default()
    };
    let ledger = Ledger::new(store.clone(), config).unwrap();
    let token = CancellationToken::new();
    let ctx = RequestContext::with_cancellation(namespace(), token.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let err = ledger
        .propose_transaction(&ctx, proposal("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Cancelled));
    // Lost once, then cancelled while waiting to retry
    assert_eq!(store.claims.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_last_index_with_single_transaction_blocks() {
    let config = LedgerConfig {
        block_size: 1,
        ..LedgerConfig::default()
    };
    let (store, ledger) = memory_ledger(config);
    let ns = namespace();
    let tx = Transaction::sequenced(proposal("last"), u64::MAX, 1, Utc::now());
    store
        .put(ns.key(u64::MAX), serde_json::to_vec(&tx).unwrap())
        .await;
    let ctx = ledger.context(ns.clone());

    let err = ledger.reconcile(&ctx).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::IncompleteBlockRange { block_num: 0, .. }
    ));
    assert_eq!(ledger.stats(&ns).await.generation, 0);
}

#[tokio::test]
async fn test_sled_backed_ledger() {
    let store = Arc::new(SledStore::open_temporary().unwrap());
    let ledger = Ledger::new(store, LedgerConfig::default()).unwrap();
    let ctx = ledger.context(namespace());

    for i in 0..6 {
        let s = ledger
            .propose_transaction(&ctx, proposal(format!("{i}")))
            .await
            .unwrap();
        assert_eq!(s.index, i);
    }

    let b1 = ledger.get_block(&ctx, 1).await.unwrap().unwrap();
    assert_eq!(b1.transactions[0].content(), "3");
}
