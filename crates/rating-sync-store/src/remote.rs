use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rating_sync_config::RemoteConfig;
use rating_sync_models::{MovieRating, NewRating};
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::traits::{ChangeCallback, RecordStore, Subscription};

/// PostgREST-style remote backend. Rows live in a single table ordered by
/// `created_at`; the change feed is a polling task watching a cheap
/// collection fingerprint (row count + newest row).
pub struct RemoteStore {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
    table: String,
    poll_interval: Duration,
    connected: AtomicBool,
}

/// Wire representation of a row. Ids may be serial integers or uuids
/// depending on how the table was provisioned.
#[derive(Debug, Deserialize)]
struct RemoteRow {
    id: Option<RowId>,
    name: String,
    movie_title: String,
    rating: u8,
    review: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RowId {
    Int(i64),
    Text(String),
}

impl RowId {
    fn into_string(self) -> String {
        match self {
            RowId::Int(n) => n.to_string(),
            RowId::Text(s) => s,
        }
    }
}

impl From<RemoteRow> for MovieRating {
    fn from(row: RemoteRow) -> Self {
        MovieRating {
            id: row.id.map(RowId::into_string),
            name: row.name,
            movie_title: row.movie_title,
            rating: row.rating,
            // Empty reviews come back as "" from older rows; normalize.
            review: row.review.filter(|r| !r.trim().is_empty()),
            created_at: row.created_at,
        }
    }
}

/// Snapshot of "has anything changed" state: total row count plus the id
/// and timestamp of the newest row. Inserts move the newest row, deletes
/// move the count.
#[derive(Debug, Clone, PartialEq)]
struct Fingerprint {
    total: Option<u64>,
    newest_id: Option<String>,
    newest_at: Option<DateTime<Utc>>,
}

/// Reduced row shape for fingerprint polls, which select only these two
/// columns.
#[derive(Debug, Deserialize)]
struct FingerprintRow {
    id: Option<RowId>,
    created_at: Option<DateTime<Utc>>,
}

impl RemoteStore {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            client: Arc::new(Client::new()),
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            table: config.table.clone(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            connected: AtomicBool::new(false),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.base_url, self.table)
    }

    fn ensure_connected(&self) -> Result<(), StoreError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::Unavailable(
                "connection was never established".to_string(),
            ))
        }
    }

    async fn fetch_fingerprint(
        client: &Client,
        table_url: &str,
        api_key: &str,
    ) -> Result<Fingerprint, StoreError> {
        let response = client
            .get(table_url)
            .query(&[
                ("select", "id,created_at"),
                ("order", "created_at.desc.nullslast"),
                ("limit", "1"),
            ])
            .header("apikey", api_key)
            .bearer_auth(api_key)
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(|e| StoreError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Fetch(format!(
                "fingerprint request failed with status {}",
                response.status()
            )));
        }

        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        let rows: Vec<FingerprintRow> = response
            .json()
            .await
            .map_err(|e| StoreError::Fetch(e.to_string()))?;
        let newest = rows.into_iter().next();

        Ok(Fingerprint {
            total,
            newest_id: newest.as_ref().and_then(|r| match &r.id {
                Some(RowId::Int(n)) => Some(n.to_string()),
                Some(RowId::Text(s)) => Some(s.clone()),
                None => None,
            }),
            newest_at: newest.and_then(|r| r.created_at),
        })
    }
}

/// Parse the total from a `Content-Range` header such as `0-0/42` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.parse().ok()
}

#[async_trait]
impl RecordStore for RemoteStore {
    fn backend_name(&self) -> &str {
        "remote"
    }

    fn has_change_feed(&self) -> bool {
        true
    }

    async fn connect(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .get(self.table_url())
            .query(&[("select", "id"), ("limit", "1")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "probe failed with status {}",
                response.status()
            )));
        }

        self.connected.store(true, Ordering::Release);
        info!(backend = "remote", table = %self.table, "Connected to record store");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<MovieRating>, StoreError> {
        self.ensure_connected()?;

        let response = self
            .client
            .get(self.table_url())
            .query(&[("select", "*"), ("order", "created_at.desc.nullslast")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| StoreError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Fetch(format!(
                "list failed with status {}",
                response.status()
            )));
        }

        let rows: Vec<RemoteRow> = response
            .json()
            .await
            .map_err(|e| StoreError::Fetch(e.to_string()))?;

        debug!(count = rows.len(), "Fetched remote ratings");
        Ok(rows.into_iter().map(MovieRating::from).collect())
    }

    async fn create(&self, record: &NewRating) -> Result<(), StoreError> {
        self.ensure_connected()?;

        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Write(format!("insert failed ({}): {}", status, body)));
        }

        info!(title = %record.movie_title, by = %record.name, "Created remote rating");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.ensure_connected()?;

        let response = self
            .client
            .delete(self.table_url())
            .query(&[("id", format!("eq.{}", id))])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            // Ask for the deleted rows back so an unknown id is detectable.
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Write(format!("delete failed ({}): {}", status, body)));
        }

        let deleted: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;
        if deleted.is_empty() {
            return Err(StoreError::Write(format!("no record with id {}", id)));
        }

        info!(id = %id, "Deleted remote rating");
        Ok(())
    }

    fn subscribe(&self, on_change: ChangeCallback) -> Result<Subscription, StoreError> {
        self.ensure_connected().map_err(|_| {
            StoreError::Subscribe("cannot subscribe before the store is connected".to_string())
        })?;

        let client = Arc::clone(&self.client);
        let table_url = self.table_url();
        let api_key = self.api_key.clone();
        let interval = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut last: Option<Fingerprint> = None;
            loop {
                match Self::fetch_fingerprint(&client, &table_url, &api_key).await {
                    Ok(current) => {
                        match &last {
                            // The first poll fires unconditionally so a
                            // mutation racing subscription setup is still
                            // observed; the refresh it triggers is
                            // idempotent.
                            None => {
                                last = Some(current);
                                on_change();
                            }
                            Some(previous) if *previous != current => {
                                debug!("Remote collection fingerprint moved, notifying");
                                last = Some(current);
                                on_change();
                            }
                            Some(_) => {}
                        }
                    }
                    Err(e) => {
                        // Transient poll failures do not tear the watcher
                        // down; the next tick retries.
                        warn!(error = %e, "Change-feed poll failed");
                    }
                }
                tokio::time::sleep(interval).await;
            }
        });

        info!(interval_secs = interval.as_secs(), "Remote change feed established");
        Ok(Subscription::from_task(task))
    }
}
