use thiserror::Error;

/// Failures surfaced by a record store backend.
///
/// Validation never appears here: invalid submissions are rejected by the
/// write path before any store interaction.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend connection was never established. Callers surface this
    /// as a persistent banner with a retry affordance.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// A transient read failure. The existing cache must be left untouched.
    #[error("failed to fetch records: {0}")]
    Fetch(String),

    /// A create or delete was rejected by the store.
    #[error("write rejected by record store: {0}")]
    Write(String),

    /// The change subscription could not be established.
    #[error("failed to subscribe to changes: {0}")]
    Subscribe(String),

    /// The backend is misconfigured and cannot be constructed.
    #[error("record store misconfigured: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether the failure is the fatal never-connected state rather than
    /// a transient error.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
