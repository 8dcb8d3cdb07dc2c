use std::fmt;

use pokedex_config::ConfigError;
use pokedex_matcher::MatchError;
use pokedex_store::StoreError;

use crate::exit_codes::{
    EXIT_DATABASE, EXIT_ERROR, EXIT_MALFORMED_SOURCE, EXIT_NOT_FOUND, EXIT_USAGE,
};

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self { code: EXIT_NOT_FOUND, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        let code = match &err {
            StoreError::NotFound(_) => EXIT_NOT_FOUND,
            StoreError::MalformedSource(_) => EXIT_MALFORMED_SOURCE,
            StoreError::Database(_) => EXIT_DATABASE,
            StoreError::Io(_) => EXIT_ERROR,
        };
        let hint = match &err {
            StoreError::MalformedSource(_) => Some("the index was left unchanged".to_string()),
            StoreError::Database(_) => {
                Some("run `pokedex reload` to rebuild the index from the CSV source".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::usage(err.to_string())
    }
}

impl From<MatchError> for CliError {
    fn from(err: MatchError) -> Self {
        Self { code: EXIT_ERROR, message: err.to_string(), hint: None }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}
