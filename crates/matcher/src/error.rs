use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// No candidates to pick a suggestion from.
    EmptyCandidates,
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCandidates => write!(f, "invalid argument: candidate list is empty"),
        }
    }
}

impl std::error::Error for MatchError {}
