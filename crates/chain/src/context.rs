use tledger_core::Namespace;
use tokio_util::sync::CancellationToken;

/// Per-request scope: which logical ledger to act on, and a way to abandon it.
///
/// Cancelling the token aborts any pending store call and surfaces
/// `LedgerError::Cancelled`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub namespace: Namespace,
    pub cancellation: CancellationToken,
}

impl RequestContext {
    /// A context with its own, never-cancelled token.
    pub fn new(namespace: Namespace) -> Self {
        Self::with_cancellation(namespace, CancellationToken::new())
    }

    pub fn with_cancellation(namespace: Namespace, cancellation: CancellationToken) -> Self {
        Self {
            namespace,
            cancellation,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
