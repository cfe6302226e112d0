//! Patch applier: turns one change plus the current document into the next
//! document.
//!
//! Every operation builds a fresh `Vec` rather than shifting lines in place.
//! Positions are never carried across a structural edit; anything needed
//! after a removal is searched for again in the shortened document.

use crate::change::{Change, Destination, Placement, RawChange, BOTH_DESTINATIONS};
use crate::document::split_block;
use crate::errors::{BatchError, BlockRole, PatchError};
use crate::matcher::Pattern;
use tracing::{debug, warn};

/// Apply a single change, returning the new document.
///
/// On error the input is untouched and no partial result exists.
pub fn apply(document: &[String], change: &Change) -> Result<Vec<String>, PatchError> {
    let result = match change {
        Change::Replace { old, new, .. } => replace(document, old, new),
        Change::Delete { content, .. } => delete(document, content),
        Change::Move {
            content,
            destination,
            ..
        } => move_block(document, content, destination),
        Change::Insert {
            content, placement, ..
        } => insert(document, content, placement),
    }?;

    debug!(
        action = %change.action(),
        before = document.len(),
        after = result.len(),
        "applied change"
    );
    Ok(result)
}

/// Validate a wire-form change and apply it.
pub fn apply_raw(document: &[String], raw: &RawChange) -> Result<Vec<String>, PatchError> {
    let change = Change::try_from(raw)?;
    apply(document, &change)
}

/// Apply `changes` in order, each against the result of the previous one.
///
/// Stops at the first failure. The returned [`BatchError`] carries the
/// document as of the last successful change; callers wanting
/// all-or-nothing semantics keep their own copy of the input.
pub fn apply_all<'a, I>(document: &[String], changes: I) -> Result<Vec<String>, BatchError>
where
    I: IntoIterator<Item = &'a Change>,
{
    let mut current = document.to_vec();
    for (index, change) in changes.into_iter().enumerate() {
        match apply(&current, change) {
            Ok(next) => current = next,
            Err(error) => {
                return Err(BatchError {
                    index,
                    comment: change.comment().map(str::to_owned),
                    error,
                    document: current,
                })
            }
        }
    }
    Ok(current)
}

/// [`apply_all`] for wire-form changes. A change that fails validation stops
/// the batch like any other failure.
pub fn apply_raw_all<'a, I>(document: &[String], changes: I) -> Result<Vec<String>, BatchError>
where
    I: IntoIterator<Item = &'a RawChange>,
{
    let mut current = document.to_vec();
    for (index, raw) in changes.into_iter().enumerate() {
        match apply_raw(&current, raw) {
            Ok(next) => current = next,
            Err(error) => {
                return Err(BatchError {
                    index,
                    comment: (!raw.comment.is_empty()).then(|| raw.comment.clone()),
                    error,
                    document: current,
                })
            }
        }
    }
    Ok(current)
}

fn replace(document: &[String], old: &str, new: &str) -> Result<Vec<String>, PatchError> {
    let old_lines = split_block(old);
    let start = locate(document, &old_lines, BlockRole::Old)?;
    let end = start + old_lines.len();

    Ok(splice(document, start, end, split_block(new)))
}

fn delete(document: &[String], content: &str) -> Result<Vec<String>, PatchError> {
    let lines = split_block(content);
    let start = locate(document, &lines, BlockRole::Content)?;
    let end = start + lines.len();

    Ok(splice(document, start, end, Vec::new()))
}

fn move_block(
    document: &[String],
    content: &str,
    destination: &Destination,
) -> Result<Vec<String>, PatchError> {
    let lines = split_block(content);
    let start = locate(document, &lines, BlockRole::Content)?;
    let end = start + lines.len();

    // The anchor must exist before anything is removed.
    resolve_destination(document, destination)?;

    let segment = document[start..end].to_vec();
    let remaining = splice(document, start, end, Vec::new());
    let at = resolve_destination(&remaining, destination)?;

    Ok(splice(&remaining, at, at, segment))
}

fn insert(
    document: &[String],
    content: &str,
    placement: &Placement,
) -> Result<Vec<String>, PatchError> {
    let lines = split_block(content);
    if document.is_empty() {
        return Ok(lines);
    }

    let destination = match placement {
        Placement::Anchored(destination) => destination,
        Placement::Unanchored => {
            return Err(PatchError::invalid(
                "insert into a non-empty document requires a destination",
            ))
        }
        Placement::Conflicting { .. } => return Err(PatchError::invalid(BOTH_DESTINATIONS)),
    };
    let at = resolve_destination(document, destination)?;

    Ok(splice(document, at, at, lines))
}

/// Index at which a block should be inserted to land on the given side of
/// the destination's anchor. Shared by move and insert.
///
/// The result is clamped to the document length so a block placed below an
/// anchor at the tail is appended.
pub fn resolve_destination(
    document: &[String],
    destination: &Destination,
) -> Result<usize, PatchError> {
    let (anchor, role) = match destination {
        Destination::Above(anchor) => (anchor, BlockRole::DestinationAbove),
        Destination::Below(anchor) => (anchor, BlockRole::DestinationBelow),
    };
    let anchor_lines = split_block(anchor);
    let start = locate(document, &anchor_lines, role)?;

    let index = match destination {
        Destination::Above(_) => start,
        Destination::Below(_) => start + anchor_lines.len(),
    };
    Ok(index.min(document.len()))
}

/// First occurrence of `block`, warning when the choice is ambiguous.
fn locate(document: &[String], block: &[String], role: BlockRole) -> Result<usize, PatchError> {
    let pattern = Pattern::new(block).ok_or_else(|| PatchError::not_found(role, block))?;
    let start = pattern
        .find(document)
        .ok_or_else(|| PatchError::not_found(role, block))?;

    if pattern.find_from(document, start + 1).is_some() {
        warn!(
            field = %role,
            occurrences = pattern.count_matches(document),
            line = start + 1,
            "block occurs more than once; using the first occurrence"
        );
    }
    Ok(start)
}

/// `document[..start] ++ replacement ++ document[end..]` as a new vector.
fn splice(document: &[String], start: usize, end: usize, replacement: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(document.len() - (end - start) + replacement.len());
    out.extend_from_slice(&document[..start]);
    out.extend(replacement);
    out.extend_from_slice(&document[end..]);
    out
}
