//! Cooperative cancellation signal shared across pipeline tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// A broadcast-backed cancellation signal.
///
/// Clones observe the same trigger, so one handle can be wired to a ctrl-c
/// handler while others are held by engine runs and progress tasks. Waiting
/// on a signal that already fired resolves immediately.
#[derive(Debug, Clone)]
pub struct Shutdown {
    triggered: Arc<AtomicBool>,
    notify_tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Creates a new, untriggered signal.
    pub fn new() -> Self {
        let (notify_tx, _) = broadcast::channel(1);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            notify_tx,
        }
    }

    /// Fires the signal. Safe to call more than once.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        let _ = self.notify_tx.send(());
    }

    /// Whether the signal has fired.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Resolves once the signal fires.
    pub async fn wait(&self) {
        // Subscribe before checking the flag so a trigger landing in
        // between is not missed.
        let mut rx = self.notify_tx.subscribe();
        if self.is_triggered() {
            return;
        }
        let _ = rx.recv().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
