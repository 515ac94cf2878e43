pub mod cache;
pub mod confirm;
pub mod filter;
pub mod render;
pub mod session;
pub mod submit;
pub mod watch;

pub use cache::RatingCache;
pub use confirm::{AutoConfirm, ConfirmDelete, DialogGate};
pub use filter::{FilterState, NameFilter, RatingFilter, ALL_SENTINEL};
pub use render::{render_timeline, star_glyphs, Timeline, TimelineEntry, NO_MATCHES_PLACEHOLDER, UNKNOWN_DATE};
pub use session::{DeleteOutcome, SessionError, TimelineSession};
pub use submit::{SubmitForm, ValidationError, ValidationIssue};
pub use watch::{ChangeWatcher, SubscriptionState};
