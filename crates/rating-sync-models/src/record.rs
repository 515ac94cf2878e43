use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted rating entry as returned by the record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRating {
    /// Store-assigned identifier; absent until the record is persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub movie_title: String,
    pub rating: u8, // 1-5 stars
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    /// Assigned at persistence time. Legacy records may lack one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A rating as submitted by the write path, before the store assigns
/// id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewRating {
    pub name: String,
    pub movie_title: String,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
}
