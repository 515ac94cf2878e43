use rating_sync_models::MovieRating;
use std::cmp::Ordering;
use tracing::debug;

/// In-memory mirror of the last known-good store state.
///
/// A fetch is an atomic replacement, never a diff: at any observable
/// instant the cache equals the full result of the most recently applied
/// fetch. Overlapping fetches are tolerated through a monotonic
/// generation: each fetch takes a ticket up front and a snapshot whose
/// ticket is older than the last applied one is discarded instead of
/// overwriting newer data.
#[derive(Debug, Default)]
pub struct RatingCache {
    records: Vec<MovieRating>,
    issued_generation: u64,
    applied_generation: u64,
}

impl RatingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a ticket for a fetch that is about to start.
    pub fn begin_fetch(&mut self) -> u64 {
        self.issued_generation += 1;
        self.issued_generation
    }

    /// Replace the cache with a completed snapshot. Returns false when the
    /// snapshot lost the race to a newer one and was discarded.
    pub fn replace_all(&mut self, generation: u64, mut records: Vec<MovieRating>) -> bool {
        if generation <= self.applied_generation {
            debug!(
                generation = generation,
                applied = self.applied_generation,
                "Discarding stale fetch snapshot"
            );
            return false;
        }

        // Newest first; records without a timestamp sort after dated ones
        // and keep their fetched order among themselves.
        records.sort_by(|a, b| match (a.created_at, b.created_at) {
            (Some(a_at), Some(b_at)) => b_at.cmp(&a_at),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        self.records = records;
        self.applied_generation = generation;
        debug!(generation = generation, count = self.records.len(), "Cache replaced");
        true
    }

    pub fn records(&self) -> &[MovieRating] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(title: &str, day: Option<u32>) -> MovieRating {
        MovieRating {
            id: Some(title.to_string()),
            name: "Dad".to_string(),
            movie_title: title.to_string(),
            rating: 4,
            review: None,
            created_at: day.map(|d| Utc.with_ymd_and_hms(2026, 8, d, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_replace_sorts_newest_first() {
        let mut cache = RatingCache::new();
        let gen = cache.begin_fetch();
        assert!(cache.replace_all(
            gen,
            vec![record("old", Some(1)), record("new", Some(5)), record("mid", Some(3))],
        ));
        let titles: Vec<&str> = cache.records().iter().map(|r| r.movie_title.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_dateless_records_sort_last_in_fetched_order() {
        let mut cache = RatingCache::new();
        let gen = cache.begin_fetch();
        cache.replace_all(
            gen,
            vec![record("legacy-a", None), record("dated", Some(2)), record("legacy-b", None)],
        );
        let titles: Vec<&str> = cache.records().iter().map(|r| r.movie_title.as_str()).collect();
        assert_eq!(titles, vec!["dated", "legacy-a", "legacy-b"]);
    }

    #[test]
    fn test_stale_snapshot_is_discarded() {
        let mut cache = RatingCache::new();
        let slow = cache.begin_fetch();
        let fast = cache.begin_fetch();

        assert!(cache.replace_all(fast, vec![record("fresh", Some(5))]));
        // The earlier fetch completes late and must not win.
        assert!(!cache.replace_all(slow, vec![record("stale", Some(1))]));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.records()[0].movie_title, "fresh");
    }

    #[test]
    fn test_replacement_is_total_not_a_merge() {
        let mut cache = RatingCache::new();
        let first = cache.begin_fetch();
        cache.replace_all(first, vec![record("a", Some(1)), record("b", Some(2))]);

        let second = cache.begin_fetch();
        cache.replace_all(second, vec![record("c", Some(3))]);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.records()[0].movie_title, "c");
    }
}
