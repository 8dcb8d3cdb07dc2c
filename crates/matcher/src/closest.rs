use crate::distance::distance;
use crate::error::MatchError;

/// A suggested candidate and its edit distance from the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion<'a> {
    pub candidate: &'a str,
    pub distance: usize,
}

/// Closest candidate to `query` by edit distance.
///
/// Ties go to the candidate seen first; pass a sorted slice for an
/// alphabetical tie-break.
pub fn closest<'a, S: AsRef<str>>(query: &str, candidates: &'a [S]) -> Result<&'a str, MatchError> {
    closest_scored(query, candidates).map(|s| s.candidate)
}

/// Like [`closest`], but also reports the winning distance.
pub fn closest_scored<'a, S: AsRef<str>>(
    query: &str,
    candidates: &'a [S],
) -> Result<Suggestion<'a>, MatchError> {
    let mut best: Option<Suggestion<'a>> = None;

    for candidate in candidates {
        let candidate = candidate.as_ref();
        let d = distance(query, candidate);
        // Strictly smaller only: earlier candidates win ties
        if best.map_or(true, |b| d < b.distance) {
            best = Some(Suggestion { candidate, distance: d });
            if d == 0 {
                break;
            }
        }
    }

    best.ok_or(MatchError::EmptyCandidates)
}
