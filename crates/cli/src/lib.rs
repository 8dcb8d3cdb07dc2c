//! `pokedex-cli`: presentation layer for the Pokedex.
//!
//! Everything here only calls into `pokedex-store` and `pokedex-matcher`.

pub mod display;
pub mod error;
pub mod exit_codes;
pub mod interactive;

pub use error::CliError;
