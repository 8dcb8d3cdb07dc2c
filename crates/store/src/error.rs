use std::fmt;

/// What a failed lookup was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Name(String),
    SpeciesId(u32),
    Type(String),
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "no pokemon named '{name}'"),
            Self::SpeciesId(id) => write!(f, "no pokemon with number {id}"),
            Self::Type(t) => write!(f, "no pokemon of type '{t}'"),
        }
    }
}

/// Why a CSV source was rejected. Line numbers are 1-based and count the
/// header.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Header does not name a required column.
    MissingColumn(String),
    /// Row is too short to hold a required column.
    MissingField { line: u64, column: String },
    /// Required text column is empty.
    EmptyValue { line: u64, column: String },
    /// Numeric column does not parse.
    InvalidNumber { line: u64, column: String, value: String },
    /// Species numbers start at 1.
    NonPositiveId { line: u64, value: u32 },
    DuplicateName { line: u64, name: String },
    DuplicateSpeciesId { line: u64, id: u32 },
    /// Reader-level CSV failure (bad quoting, etc.).
    Csv(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn(column) => write!(f, "missing required column '{column}'"),
            Self::MissingField { line, column } => {
                write!(f, "line {line}: no value for column '{column}'")
            }
            Self::EmptyValue { line, column } => {
                write!(f, "line {line}: column '{column}' must not be empty")
            }
            Self::InvalidNumber { line, column, value } => {
                write!(f, "line {line}: column '{column}': cannot parse number '{value}'")
            }
            Self::NonPositiveId { line, value } => {
                write!(f, "line {line}: species id must be positive, got {value}")
            }
            Self::DuplicateName { line, name } => {
                write!(f, "line {line}: duplicate pokemon name '{name}'")
            }
            Self::DuplicateSpeciesId { line, id } => {
                write!(f, "line {line}: duplicate species id {id}")
            }
            Self::Csv(msg) => write!(f, "csv error: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

#[derive(Debug)]
pub enum StoreError {
    /// Lookup miss. Recoverable.
    NotFound(Lookup),
    /// Source file rejected; the index is left as it was.
    MalformedSource(SourceError),
    /// SQLite failure.
    Database(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(lookup) => write!(f, "not found: {lookup}"),
            Self::MalformedSource(err) => write!(f, "malformed source: {err}"),
            Self::Database(msg) => write!(f, "database error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedSource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SourceError> for StoreError {
    fn from(err: SourceError) -> Self {
        Self::MalformedSource(err)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}
