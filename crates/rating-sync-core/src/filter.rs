use rating_sync_models::MovieRating;
use std::collections::BTreeSet;

/// Reserved selector value meaning "no filtering".
pub const ALL_SENTINEL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NameFilter {
    #[default]
    All,
    Contributor(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatingFilter {
    #[default]
    All,
    Exactly(u8),
}

impl NameFilter {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case(ALL_SENTINEL) {
            NameFilter::All
        } else {
            NameFilter::Contributor(value.to_string())
        }
    }

    pub fn matches(&self, record: &MovieRating) -> bool {
        match self {
            NameFilter::All => true,
            NameFilter::Contributor(name) => record.name == *name,
        }
    }
}

impl RatingFilter {
    pub fn matches(&self, record: &MovieRating) -> bool {
        match self {
            RatingFilter::All => true,
            RatingFilter::Exactly(stars) => record.rating == *stars,
        }
    }
}

/// The two independent timeline selectors, both defaulting to "all".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub name: NameFilter,
    pub rating: RatingFilter,
}

impl FilterState {
    pub fn matches(&self, record: &MovieRating) -> bool {
        self.name.matches(record) && self.rating.matches(record)
    }

    pub fn apply<'a>(&self, records: &'a [MovieRating]) -> Vec<&'a MovieRating> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    /// After a filter-options rebuild, keep the current name selection if
    /// it still exists and silently revert to "all" otherwise. `options`
    /// is the output of [`name_options`], sentinel included.
    pub fn reconcile_names(&mut self, options: &[String]) {
        if let NameFilter::Contributor(selected) = &self.name {
            if !options.iter().any(|o| o == selected) {
                self.name = NameFilter::All;
            }
        }
    }
}

/// Selectable name-filter values for the current cache: deduplicated,
/// lexicographically sorted contributor names with the "all" sentinel
/// always first.
pub fn name_options(records: &[MovieRating]) -> Vec<String> {
    let names: BTreeSet<&str> = records.iter().map(|r| r.name.as_str()).collect();
    let mut options = Vec::with_capacity(names.len() + 1);
    options.push(ALL_SENTINEL.to_string());
    options.extend(names.into_iter().map(|n| n.to_string()));
    options
}
