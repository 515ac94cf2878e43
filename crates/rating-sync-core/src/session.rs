use rating_sync_store::{RecordStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

use crate::cache::RatingCache;
use crate::confirm::{ConfirmDelete, DialogGate};
use crate::filter::{name_options, FilterState};
use crate::render::{render_timeline, Timeline};
use crate::submit::{SubmitForm, ValidationError};
use crate::watch::{ChangeWatcher, SubscriptionState};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("confirmation failed: {0}")]
    Confirm(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// Application root of the rating timeline: owns the store handle, the
/// cache, the filter state and the change watcher, and is the single
/// writer of all of them. Front ends hold one of these per page session.
pub struct TimelineSession {
    store: Arc<dyn RecordStore>,
    cache: RatingCache,
    filters: FilterState,
    name_options: Vec<String>,
    watcher: ChangeWatcher,
    confirm: DialogGate,
}

impl TimelineSession {
    pub fn new(store: Arc<dyn RecordStore>, confirmer: Box<dyn ConfirmDelete>) -> Self {
        Self {
            store,
            cache: RatingCache::new(),
            filters: FilterState::default(),
            name_options: vec![crate::filter::ALL_SENTINEL.to_string()],
            watcher: ChangeWatcher::new(),
            confirm: DialogGate::new(confirmer),
        }
    }

    pub fn with_filters(mut self, filters: FilterState) -> Self {
        self.filters = filters;
        self
    }

    pub fn has_change_feed(&self) -> bool {
        self.store.has_change_feed()
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        self.watcher.state()
    }

    /// Connect, subscribe to change notifications, then perform the
    /// initial full fetch, in that order, so a mutation racing startup is
    /// still observed by one path or the other.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<(), StoreError> {
        self.store.connect().await?;
        self.watcher.start(self.store.as_ref())?;
        self.refresh().await?;
        info!(
            backend = self.store.backend_name(),
            records = self.cache.len(),
            "Timeline session started"
        );
        Ok(())
    }

    /// Full resynchronization: fetch, atomically replace the cache, then
    /// rebuild the filter options. Idempotent and safe to trigger from any
    /// number of sources; a snapshot that lost the race to a newer fetch
    /// is discarded and reported as `Ok(false)`.
    ///
    /// On failure the cache and filter state are left exactly as they
    /// were.
    pub async fn refresh(&mut self) -> Result<bool, StoreError> {
        let generation = self.cache.begin_fetch();
        let records = self.store.list_all().await?;
        let applied = self.cache.replace_all(generation, records);
        if applied {
            self.name_options = name_options(self.cache.records());
            self.filters.reconcile_names(&self.name_options);
        }
        Ok(applied)
    }

    /// Pure rendering of the current cache through the current filters.
    pub fn render(&self) -> Timeline {
        render_timeline(self.cache.records(), &self.filters)
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
        self.filters.reconcile_names(&self.name_options);
    }

    /// Current name-filter options: "all" plus every contributor in the
    /// cache, sorted.
    pub fn name_options(&self) -> &[String] {
        &self.name_options
    }

    /// Validate and persist a submission. The cache is never mutated
    /// directly: a backend with a change feed pushes the refetch through
    /// the watcher, and one without gets the refresh invoked here.
    pub async fn submit(&mut self, form: &mut SubmitForm) -> Result<(), SessionError> {
        let record = form.validate()?;
        self.store.create(&record).await?;
        form.reset();
        info!(title = %record.movie_title, by = %record.name, "Rating submitted");

        if !self.store.has_change_feed() {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Delete with explicit confirmation. Cancelling performs no store
    /// interaction at all.
    pub async fn request_delete(&mut self, id: &str) -> Result<DeleteOutcome, SessionError> {
        let confirmed = self
            .confirm
            .confirm("Are you sure you want to delete this movie entry?")
            .await
            .map_err(|e| SessionError::Confirm(e.to_string()))?;
        if !confirmed {
            info!(id = %id, "Deletion cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        self.store.delete(id).await?;
        info!(id = %id, "Rating deleted");

        if !self.store.has_change_feed() {
            self.refresh().await?;
        }
        Ok(DeleteOutcome::Deleted)
    }

    /// Wait for the next change notification (follow mode).
    pub async fn next_invalidation(&mut self) {
        self.watcher.next_invalidation().await;
    }

    /// Non-blocking check for a pending notification.
    pub fn try_next_invalidation(&mut self) -> bool {
        self.watcher.try_next_invalidation()
    }

    /// Tear the subscription down. Also happens on drop.
    pub fn close(&mut self) {
        self.watcher.close();
        info!("Timeline session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::AutoConfirm;
    use crate::filter::{NameFilter, RatingFilter};
    use async_trait::async_trait;
    use chrono::Utc;
    use rating_sync_models::{MovieRating, NewRating};
    use rating_sync_store::{ChangeCallback, Subscription};
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Programmable in-memory backend: snapshots can be edited directly
    /// and change notifications fired by hand.
    struct MemoryStore {
        records: Mutex<Vec<MovieRating>>,
        callbacks: Mutex<Vec<ChangeCallback>>,
        next_id: AtomicU64,
        create_calls: AtomicUsize,
        fail_fetch: AtomicBool,
        feed: bool,
    }

    impl MemoryStore {
        fn new(feed: bool) -> Arc<Self> {
            Arc::new(Self {
                records: Mutex::new(Vec::new()),
                callbacks: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                create_calls: AtomicUsize::new(0),
                fail_fetch: AtomicBool::new(false),
                feed,
            })
        }

        fn insert_directly(&self, title: &str, name: &str, rating: u8) {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.records.lock().unwrap().insert(
                0,
                MovieRating {
                    id: Some(id.to_string()),
                    name: name.to_string(),
                    movie_title: title.to_string(),
                    rating,
                    review: None,
                    created_at: Some(Utc::now()),
                },
            );
        }

        fn fire_change(&self) {
            for callback in self.callbacks.lock().unwrap().iter() {
                callback();
            }
        }

        fn snapshot_ids(&self) -> Vec<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .filter_map(|r| r.id.clone())
                .collect()
        }
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        fn backend_name(&self) -> &str {
            "memory"
        }

        fn has_change_feed(&self) -> bool {
            self.feed
        }

        async fn connect(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn list_all(&self) -> Result<Vec<MovieRating>, StoreError> {
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(StoreError::Fetch("injected failure".to_string()));
            }
            Ok(self.records.lock().unwrap().clone())
        }

        async fn create(&self, record: &NewRating) -> Result<(), StoreError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.records.lock().unwrap().insert(
                0,
                MovieRating {
                    id: Some(id.to_string()),
                    name: record.name.clone(),
                    movie_title: record.movie_title.clone(),
                    rating: record.rating,
                    review: record.review.clone(),
                    created_at: Some(Utc::now()),
                },
            );
            Ok(())
        }

        async fn delete(&self, id: &str) -> Result<(), StoreError> {
            let mut records = self.records.lock().unwrap();
            let position = records
                .iter()
                .position(|r| r.id.as_deref() == Some(id))
                .ok_or_else(|| StoreError::Write(format!("no record with id {}", id)))?;
            records.remove(position);
            Ok(())
        }

        fn subscribe(&self, on_change: ChangeCallback) -> Result<Subscription, StoreError> {
            self.callbacks.lock().unwrap().push(on_change);
            Ok(Subscription::noop())
        }
    }

    fn session_over(store: &Arc<MemoryStore>) -> TimelineSession {
        TimelineSession::new(store.clone(), Box::new(AutoConfirm(true)))
    }

    fn valid_form(title: &str, name: &str, rating: &str) -> SubmitForm {
        SubmitForm {
            name_choice: name.to_string(),
            movie_title: title.to_string(),
            rating: rating.to_string(),
            ..SubmitForm::default()
        }
    }

    #[tokio::test]
    async fn test_start_subscribes_then_fetches() {
        let store = MemoryStore::new(true);
        store.insert_directly("Dune", "Dad", 5);

        let mut session = session_over(&store);
        assert_eq!(session.subscription_state(), SubscriptionState::Uninitialized);
        session.start().await.unwrap();

        assert_eq!(session.subscription_state(), SubscriptionState::Active);
        assert_eq!(session.render().entries().len(), 1);
        assert_eq!(session.name_options(), ["all", "Dad"]);
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_cache_untouched() {
        let store = MemoryStore::new(true);
        store.insert_directly("Dune", "Dad", 5);
        let mut session = session_over(&store);
        session.start().await.unwrap();

        store.insert_directly("Frozen", "Mom", 3);
        store.fail_fetch.store(true, Ordering::SeqCst);
        let err = session.refresh().await.unwrap_err();
        assert!(matches!(err, StoreError::Fetch(_)));

        // Still the pre-failure view, options included.
        assert_eq!(session.render().entries().len(), 1);
        assert_eq!(session.name_options(), ["all", "Dad"]);
    }

    #[tokio::test]
    async fn test_submit_round_trip_without_change_feed() {
        let store = MemoryStore::new(false);
        let mut session = session_over(&store);
        session.start().await.unwrap();

        let mut form = valid_form("Dune", "Dad", "5");
        form.review = "epic sand".to_string();
        session.submit(&mut form).await.unwrap();

        // No change feed, so the write path refreshed explicitly.
        let timeline = session.render();
        assert_eq!(timeline.entries().len(), 1);
        let entry = &timeline.entries()[0];
        assert_eq!(entry.title, "Dune");
        assert_eq!(entry.name, "Dad");
        assert_eq!(entry.stars, "★★★★★");
        assert_eq!(entry.review.as_deref(), Some("epic sand"));
        assert!(entry.id.is_some());
        // Inputs reset to defaults after a successful submission.
        assert_eq!(form, SubmitForm::default());
    }

    #[tokio::test]
    async fn test_submit_with_change_feed_does_not_touch_cache() {
        let store = MemoryStore::new(true);
        let mut session = session_over(&store);
        session.start().await.unwrap();

        let mut form = valid_form("Dune", "Dad", "5");
        session.submit(&mut form).await.unwrap();

        // Consistency arrives via the feed-triggered refetch, never by
        // direct cache mutation.
        assert_eq!(session.render().entries().len(), 0);
        session.refresh().await.unwrap();
        assert_eq!(session.render().entries().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_submission_never_reaches_store() {
        let store = MemoryStore::new(false);
        let mut session = session_over(&store);
        session.start().await.unwrap();

        let mut form = SubmitForm::default();
        let err = session.submit(&mut form).await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let store = MemoryStore::new(false);
        store.insert_directly("Dune", "Dad", 5);

        let mut declined = TimelineSession::new(store.clone(), Box::new(AutoConfirm(false)));
        declined.start().await.unwrap();
        let id = declined.render().entries()[0].id.clone().unwrap();

        assert_eq!(
            declined.request_delete(&id).await.unwrap(),
            DeleteOutcome::Cancelled
        );
        assert_eq!(store.snapshot_ids().len(), 1);

        let mut accepted = session_over(&store);
        accepted.start().await.unwrap();
        assert_eq!(
            accepted.request_delete(&id).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert!(store.snapshot_ids().is_empty());
        assert_eq!(accepted.render().entries().len(), 0);
    }

    #[tokio::test]
    async fn test_delete_failure_leaves_cache_untouched() {
        let store = MemoryStore::new(false);
        store.insert_directly("Dune", "Dad", 5);
        let mut session = session_over(&store);
        session.start().await.unwrap();

        let err = session.request_delete("does-not-exist").await.unwrap_err();
        assert!(matches!(err, SessionError::Store(StoreError::Write(_))));
        assert_eq!(session.render().entries().len(), 1);
    }

    #[tokio::test]
    async fn test_notification_storm_coalesces_to_final_state() {
        let store = MemoryStore::new(true);
        let mut session = session_over(&store);
        session.start().await.unwrap();

        // Burst of remote mutations, each firing a notification.
        for i in 0..10 {
            store.insert_directly(&format!("Movie {}", i), "Dad", 4);
            store.fire_change();
        }

        // Drain the pending invalidations the way the follow loop does.
        let mut refreshes = 0;
        while session.try_next_invalidation() {
            session.refresh().await.unwrap();
            refreshes += 1;
        }

        // Coalesced: far fewer refreshes than notifications.
        assert!(refreshes >= 1 && refreshes <= 2, "got {} refreshes", refreshes);

        // Final state matches the last completed fetch exactly: no
        // duplicates, nothing missing.
        let shown: Vec<String> = session
            .render()
            .entries()
            .iter()
            .filter_map(|e| e.id.clone())
            .collect();
        assert_eq!(shown, store.snapshot_ids());
        let mut deduped = shown.clone();
        deduped.dedup();
        assert_eq!(shown, deduped);
    }

    #[tokio::test]
    async fn test_filter_selection_survives_refresh() {
        let store = MemoryStore::new(true);
        store.insert_directly("Dune", "Dad", 5);
        store.insert_directly("Frozen", "Mom", 3);
        let mut session = session_over(&store);
        session.start().await.unwrap();

        session.set_filters(FilterState {
            name: NameFilter::Contributor("Mom".to_string()),
            rating: RatingFilter::All,
        });
        store.insert_directly("Up", "Mom", 4);
        session.refresh().await.unwrap();

        // Mom still exists, so the selection is preserved.
        assert_eq!(
            session.filters().name,
            NameFilter::Contributor("Mom".to_string())
        );
        assert_eq!(session.render().entries().len(), 2);

        // Remove every Mom record; the selection silently reverts to all.
        let mom_ids: Vec<String> = store
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.name == "Mom")
            .filter_map(|r| r.id.clone())
            .collect();
        for id in mom_ids {
            store.delete(&id).await.unwrap();
        }
        session.refresh().await.unwrap();
        assert_eq!(session.filters().name, NameFilter::All);
    }

    #[tokio::test]
    async fn test_close_transitions_to_closed() {
        let store = MemoryStore::new(true);
        let mut session = session_over(&store);
        session.start().await.unwrap();
        session.close();
        assert_eq!(session.subscription_state(), SubscriptionState::Closed);
    }
}
