pub mod record;

pub use record::{MovieRating, NewRating};
