use async_trait::async_trait;
use chrono::Utc;
use rating_sync_models::{MovieRating, NewRating};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::traits::{ChangeCallback, RecordStore, Subscription};

/// Single-process persistent backend: one JSON document holding the whole
/// collection, newest first. There is no change feed; writers are expected
/// to trigger the refresh path themselves.
pub struct LocalStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the document.
    lock: Mutex<()>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    /// Ids must stay stable across reloads for delete-by-id to hold, so
    /// the counter is persisted alongside the entries.
    next_id: u64,
    entries: Vec<MovieRating>,
}

impl LocalStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Collection {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No local collection yet, starting empty");
            return Collection::default();
        }

        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<Collection>(&content) {
                Ok(collection) => collection,
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Local collection is corrupt, setting it aside and starting empty"
                    );
                    let aside = self.path.with_extension("json.corrupt");
                    if let Err(rename_err) = std::fs::rename(&self.path, &aside) {
                        warn!(error = %rename_err, "Failed to set corrupt collection aside");
                    }
                    Collection::default()
                }
            },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read local collection");
                Collection::default()
            }
        }
    }

    fn save(&self, collection: &Collection) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Write(format!("create data directory: {}", e)))?;
        }
        let json = serde_json::to_string_pretty(collection)
            .map_err(|e| StoreError::Write(format!("serialize collection: {}", e)))?;
        std::fs::write(&self.path, json)
            .map_err(|e| StoreError::Write(format!("write collection: {}", e)))?;
        debug!(entries = collection.entries.len(), "Saved local collection");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    fn backend_name(&self) -> &str {
        "local"
    }

    async fn connect(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("create data directory: {}", e)))?;
        }
        info!(path = %self.path.display(), "Local record store ready");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<MovieRating>, StoreError> {
        let _guard = self.lock.lock().expect("local store lock poisoned");
        Ok(self.load().entries)
    }

    async fn create(&self, record: &NewRating) -> Result<(), StoreError> {
        let _guard = self.lock.lock().expect("local store lock poisoned");
        let mut collection = self.load();

        let id = collection.next_id;
        collection.next_id += 1;
        let entry = MovieRating {
            id: Some(id.to_string()),
            name: record.name.clone(),
            movie_title: record.movie_title.clone(),
            rating: record.rating,
            review: record.review.clone(),
            created_at: Some(Utc::now()),
        };
        // Newest first: order in the document is the timeline order.
        collection.entries.insert(0, entry);

        self.save(&collection)?;
        info!(id = id, title = %record.movie_title, "Created local rating");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().expect("local store lock poisoned");
        let mut collection = self.load();

        let position = collection
            .entries
            .iter()
            .position(|e| e.id.as_deref() == Some(id))
            .ok_or_else(|| StoreError::Write(format!("no record with id {}", id)))?;
        collection.entries.remove(position);

        self.save(&collection)?;
        info!(id = %id, "Deleted local rating");
        Ok(())
    }

    fn subscribe(&self, _on_change: ChangeCallback) -> Result<Subscription, StoreError> {
        // No change feed: all mutations happen in this process, and each
        // write path triggers the refresh directly.
        Ok(Subscription::noop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> LocalStore {
        LocalStore::new(dir.path().join("ratings.json"))
    }

    fn sample(title: &str, name: &str, rating: u8) -> NewRating {
        NewRating {
            name: name.to_string(),
            movie_title: title.to_string(),
            rating,
            review: None,
        }
    }

    #[tokio::test]
    async fn test_create_list_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.connect().await.unwrap();

        store.create(&sample("Dune", "Dad", 5)).await.unwrap();
        store
            .create(&NewRating {
                review: Some("a bit cold".to_string()),
                ..sample("Frozen", "Mom", 3)
            })
            .await
            .unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        // Newest first.
        assert_eq!(all[0].movie_title, "Frozen");
        assert_eq!(all[0].review.as_deref(), Some("a bit cold"));
        assert_eq!(all[1].movie_title, "Dune");
        assert!(all.iter().all(|r| r.id.is_some()));
        assert!(all.iter().all(|r| r.created_at.is_some()));
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.create(&sample("Dune", "Dad", 5)).await.unwrap();
        store.create(&sample("Frozen", "Mom", 3)).await.unwrap();

        let all = store.list_all().await.unwrap();
        let dune_id = all
            .iter()
            .find(|r| r.movie_title == "Dune")
            .and_then(|r| r.id.clone())
            .unwrap();
        store.delete(&dune_id).await.unwrap();

        let remaining = store.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].movie_title, "Frozen");
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_write_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let err = store.delete("999").await.unwrap_err();
        assert!(matches!(err, StoreError::Write(_)));
    }

    #[tokio::test]
    async fn test_ids_stay_stable_across_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ratings.json");

        let store = LocalStore::new(path.clone());
        store.create(&sample("Dune", "Dad", 5)).await.unwrap();
        let first_id = store.list_all().await.unwrap()[0].id.clone().unwrap();

        // A fresh handle over the same file must not reuse the id.
        let reopened = LocalStore::new(path);
        reopened.create(&sample("Frozen", "Mom", 3)).await.unwrap();
        let all = reopened.list_all().await.unwrap();
        let second_id = all[0].id.clone().unwrap();
        assert_ne!(first_id, second_id);
        assert!(all.iter().any(|r| r.id.as_deref() == Some(first_id.as_str())));
    }

    #[tokio::test]
    async fn test_corrupt_file_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ratings.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = LocalStore::new(path.clone());
        assert!(store.list_all().await.unwrap().is_empty());
        // The broken document was set aside, not destroyed.
        assert!(path.with_extension("json.corrupt").exists());

        store.create(&sample("Dune", "Dad", 5)).await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(!store.has_change_feed());
        let subscription = store.subscribe(Box::new(|| {})).unwrap();
        assert!(!subscription.is_active());
    }
}
