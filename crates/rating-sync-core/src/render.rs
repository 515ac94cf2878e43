use chrono::{DateTime, Utc};
use rating_sync_models::MovieRating;
use serde::Serialize;

use crate::filter::FilterState;

pub const NO_MATCHES_PLACEHOLDER: &str = "No movies match your filters. Try something else!";
pub const UNKNOWN_DATE: &str = "Unknown Date";

const FILLED_STAR: char = '★';
const EMPTY_STAR: char = '☆';

/// One display row of the timeline, ready for materialization by any
/// front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    /// Delete affordances are wired to this.
    pub id: Option<String>,
    pub title: String,
    pub stars: String,
    /// Omitted entirely when the record has no review.
    pub review: Option<String>,
    pub name: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "entries")]
pub enum Timeline {
    /// Nothing survived the filters; show the fixed placeholder.
    NoMatches,
    Entries(Vec<TimelineEntry>),
}

impl Timeline {
    pub fn entries(&self) -> &[TimelineEntry] {
        match self {
            Timeline::NoMatches => &[],
            Timeline::Entries(entries) => entries,
        }
    }
}

/// Exactly `rating` filled glyphs followed by `5 - rating` empty ones,
/// always 5 total. Out-of-range values never reach this point; clamp
/// defensively anyway so a bad legacy row cannot panic the renderer.
pub fn star_glyphs(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    let mut stars = String::with_capacity(5 * FILLED_STAR.len_utf8());
    for _ in 0..filled {
        stars.push(FILLED_STAR);
    }
    for _ in filled..5 {
        stars.push(EMPTY_STAR);
    }
    stars
}

fn format_date(created_at: Option<DateTime<Utc>>) -> String {
    match created_at {
        Some(at) => at.format("%B %-d, %Y").to_string(),
        None => UNKNOWN_DATE.to_string(),
    }
}

/// Pure rendering step: (cache, filters) -> display list. The cache is
/// already sorted newest first; filtering preserves that order.
pub fn render_timeline(records: &[MovieRating], filters: &FilterState) -> Timeline {
    let filtered = filters.apply(records);
    if filtered.is_empty() {
        return Timeline::NoMatches;
    }

    let entries = filtered
        .into_iter()
        .map(|record| TimelineEntry {
            id: record.id.clone(),
            title: record.movie_title.clone(),
            stars: star_glyphs(record.rating),
            review: record.review.clone(),
            name: record.name.clone(),
            date: format_date(record.created_at),
        })
        .collect();
    Timeline::Entries(entries)
}
