//! Application lifetime signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Scope of one running storefront.
///
/// Long-running tasks subscribe and exit when the lifetime is disposed.
#[derive(Clone)]
pub struct Lifetime {
    tx: broadcast::Sender<()>,
    disposed: Arc<AtomicBool>,
}

impl Lifetime {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            disposed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to the disposal signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// End the lifetime. Returns `false` if it had already ended.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return false;
        }
        let _ = self.tx.send(());
        tracing::debug!(tasks = self.tx.receiver_count(), "Lifetime disposed");
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Number of tasks still listening.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::new()
    }
}
