//! Near-miss hints for blocks that could not be located.
//!
//! Matching itself is always exact; this only helps a user spot why a
//! `BlockNotFound` happened (a stray space, a renamed identifier).

use crate::errors::PatchError;

/// Below this similarity a line is not worth suggesting.
const MIN_SIMILARITY: f64 = 0.6;

/// A document line resembling the first line of a missing block.
#[derive(Debug, Clone, PartialEq)]
pub struct NearMiss<'a> {
    /// Zero-based line index.
    pub index: usize,
    pub line: &'a str,
    /// Normalized Levenshtein similarity in `[0, 1]`.
    pub similarity: f64,
}

/// Most similar line to `target`, if any is similar enough. Ties go to the
/// earliest line.
pub fn closest_line<'a>(document: &'a [String], target: &str) -> Option<NearMiss<'a>> {
    let mut best: Option<NearMiss<'a>> = None;
    for (index, line) in document.iter().enumerate() {
        let similarity = strsim::normalized_levenshtein(line, target);
        if similarity < MIN_SIMILARITY {
            continue;
        }
        if best.as_ref().map_or(true, |b| similarity > b.similarity) {
            best = Some(NearMiss {
                index,
                line,
                similarity,
            });
        }
    }
    best
}

/// Hint for a failed change, or `None` when the error is not a missing block
/// or nothing in the document comes close.
pub fn hint_for<'a>(document: &'a [String], error: &PatchError) -> Option<NearMiss<'a>> {
    match error {
        PatchError::BlockNotFound { first_line, .. } => closest_line(document, first_line),
        PatchError::InvalidChange { .. } => None,
    }
}
