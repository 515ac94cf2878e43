use rating_sync_config::OTHERS_SENTINEL;
use rating_sync_models::NewRating;
use std::fmt;

/// Raw submission fields as entered, before any validation. The rating
/// stays textual here so "not a number" and "out of range" are both just
/// invalid ratings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitForm {
    /// A configured contributor, or the OTHERS sentinel.
    pub name_choice: String,
    /// Free-text name, only meaningful when `name_choice` is OTHERS.
    pub other_name: String,
    pub movie_title: String,
    pub rating: String,
    pub review: String,
}

impl SubmitForm {
    /// The effective contributor name: OTHERS switches to the free-text
    /// field, anything else is taken as-is. Always trimmed.
    pub fn effective_name(&self) -> &str {
        if self.name_choice.trim() == OTHERS_SENTINEL {
            self.other_name.trim()
        } else {
            self.name_choice.trim()
        }
    }

    /// Clear every field back to its default, as the form does after a
    /// successful submission.
    pub fn reset(&mut self) {
        *self = SubmitForm::default();
    }

    /// Check every condition and report all violations together, or
    /// produce the record the store will be asked to persist.
    pub fn validate(&self) -> Result<NewRating, ValidationError> {
        let mut issues = Vec::new();

        let name = self.effective_name();
        if name.is_empty() {
            issues.push(ValidationIssue::MissingName);
        }

        let title = self.movie_title.trim();
        if title.is_empty() {
            issues.push(ValidationIssue::MissingTitle);
        }

        let rating = match self.rating.trim().parse::<u8>() {
            Ok(stars @ 1..=5) => Some(stars),
            _ => {
                issues.push(ValidationIssue::InvalidRating);
                None
            }
        };

        if !issues.is_empty() {
            return Err(ValidationError { issues });
        }

        let review = self.review.trim();
        Ok(NewRating {
            name: name.to_string(),
            movie_title: title.to_string(),
            rating: rating.expect("rating present when no issues were recorded"),
            review: if review.is_empty() {
                None
            } else {
                Some(review.to_string())
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingName,
    MissingTitle,
    InvalidRating,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingName => write!(f, "your name is selected or entered"),
            ValidationIssue::MissingTitle => write!(f, "a movie title is provided"),
            ValidationIssue::InvalidRating => write!(f, "a valid rating is selected (1-5)"),
        }
    }
}

/// Cumulative pre-submission failure: every violated condition, not just
/// the first. Never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl std::error::Error for ValidationError {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "please ensure that ")?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                write!(f, ", and ")?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}
