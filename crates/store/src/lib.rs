//! `pokedex-store`: the Pokedex record store.
//!
//! Parses the CSV source into [`Pokemon`] records and keeps them in a SQLite
//! index that is rebuilt wholesale on every load. Every listing is
//! deduplicated and sorted ascending.

pub mod error;
pub mod index;
pub mod record;
pub mod source;
pub mod store;

pub use error::{Lookup, SourceError, StoreError};
pub use index::IndexInfo;
pub use record::Pokemon;
pub use source::{Source, SourceData};
pub use store::Store;

/// Index schema version.
/// Increment when the table layout changes; older indexes are rebuilt.
pub const SCHEMA_VERSION: u32 = 1;

pub type Result<T> = std::result::Result<T, StoreError>;
