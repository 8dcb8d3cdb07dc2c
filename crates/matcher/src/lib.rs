//! `pokedex-matcher`: "did you mean" suggestions for unknown names.
//!
//! Pure string crate: knows nothing about the dataset. Callers lowercase
//! their inputs before asking for a suggestion.

pub mod closest;
pub mod distance;
pub mod error;

pub use closest::{closest, closest_scored, Suggestion};
pub use distance::distance;
pub use error::MatchError;
