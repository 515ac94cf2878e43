use rating_sync_store::{RecordStore, StoreError, Subscription};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Lifecycle of the change subscription. `Closed` only happens at
/// teardown; there is no cancellation API beyond that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Uninitialized,
    Subscribing,
    Active,
    Closed,
}

/// Receives coarse invalidation signals from the store and hands them to
/// the session's event loop.
///
/// Delivery runs through a capacity-1 channel written with `try_send`: a
/// full channel means a refresh is already pending, so any number of
/// concurrent notifications coalesce into one. That is sufficient for
/// correctness because the refresh is an idempotent full replacement;
/// the channel only spares redundant fetches.
pub struct ChangeWatcher {
    state: SubscriptionState,
    subscription: Option<Subscription>,
    tx: mpsc::Sender<()>,
    rx: mpsc::Receiver<()>,
}

impl ChangeWatcher {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            state: SubscriptionState::Uninitialized,
            subscription: None,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    /// Establish the store subscription. For backends without a change
    /// feed this still transitions to `Active`; the subscription behind it
    /// is simply inert and writes invalidate explicitly.
    pub fn start(&mut self, store: &dyn RecordStore) -> Result<(), StoreError> {
        self.state = SubscriptionState::Subscribing;
        let tx = self.tx.clone();
        let subscription = store.subscribe(Box::new(move || {
            // A full channel already carries a pending refresh.
            let _ = tx.try_send(());
        }))?;
        self.subscription = Some(subscription);
        self.state = SubscriptionState::Active;
        info!(backend = store.backend_name(), "Change subscription active");
        Ok(())
    }

    /// Queue an invalidation from inside the process, e.g. after a local
    /// write on a backend with no change feed.
    pub fn invalidate(&self) {
        let _ = self.tx.try_send(());
    }

    /// Wait for the next invalidation signal.
    pub async fn next_invalidation(&mut self) {
        if self.rx.recv().await.is_none() {
            // All senders gone; only happens during teardown.
            debug!("Invalidation channel closed");
        }
    }

    /// Non-blocking drain, used by tests and one-shot flows.
    pub fn try_next_invalidation(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }

    pub fn close(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }
        self.state = SubscriptionState::Closed;
        debug!("Change subscription closed");
    }
}

impl Default for ChangeWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        if self.state != SubscriptionState::Closed {
            self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalidations_coalesce() {
        let mut watcher = ChangeWatcher::new();
        // A storm of signals with no consumer collapses to one pending.
        for _ in 0..10 {
            watcher.invalidate();
        }
        assert!(watcher.try_next_invalidation());
        assert!(!watcher.try_next_invalidation());
    }

    #[tokio::test]
    async fn test_next_invalidation_wakes() {
        let mut watcher = ChangeWatcher::new();
        watcher.invalidate();
        watcher.next_invalidation().await;
        assert!(!watcher.try_next_invalidation());
    }

    #[test]
    fn test_state_starts_uninitialized() {
        let watcher = ChangeWatcher::new();
        assert_eq!(watcher.state(), SubscriptionState::Uninitialized);
    }
}
