use async_trait::async_trait;
use rating_sync_models::{MovieRating, NewRating};

use crate::error::StoreError;

/// Invalidation signal fired per detected mutation. Deliberately carries no
/// payload: the collection may have changed, refresh.
pub type ChangeCallback = Box<dyn Fn() + Send + Sync + 'static>;

#[async_trait]
pub trait RecordStore: Send + Sync {
    fn backend_name(&self) -> &str;

    /// Whether this backend pushes change notifications. When false,
    /// callers must invoke the refresh path directly after every write.
    fn has_change_feed(&self) -> bool {
        false
    }

    /// Establish the backend connection. Until this succeeds every other
    /// operation fails with `StoreError::Unavailable`.
    async fn connect(&self) -> Result<(), StoreError>;

    /// Full snapshot of the collection, newest first.
    async fn list_all(&self) -> Result<Vec<MovieRating>, StoreError>;

    /// Persist a new record. Id and timestamp are store-assigned; the
    /// result becomes observable via `list_all` and the change feed.
    async fn create(&self, record: &NewRating) -> Result<(), StoreError>;

    /// Remove a record. Unknown ids are a `StoreError::Write`; deletion
    /// is not idempotent at this layer.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Start a long-lived watcher invoking `on_change` at least once per
    /// remote mutation, within a bounded delay. Backends without a change
    /// feed return a no-op subscription.
    fn subscribe(&self, on_change: ChangeCallback) -> Result<Subscription, StoreError>;
}

/// Handle for an established change watcher. Dropping it tears the
/// watcher down.
pub struct Subscription {
    task: Option<tokio::task::JoinHandle<()>>,
}

impl Subscription {
    pub fn from_task(task: tokio::task::JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// A subscription with nothing behind it, for backends without a
    /// change feed.
    pub fn noop() -> Self {
        Self { task: None }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    pub fn close(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
