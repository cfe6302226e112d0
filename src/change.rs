//! Change model.
//!
//! [`RawChange`] is the flat record found in change-set files, where every
//! action shares one set of optional string fields. [`Change`] is the
//! validated form with exactly the payload each action uses; converting
//! between them is where malformed changes are rejected.

use crate::errors::PatchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a moved or inserted block lands relative to an anchor block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Immediately before the anchor.
    Above(String),
    /// Immediately after the anchor.
    Below(String),
}

impl Destination {
    pub fn anchor(&self) -> &str {
        match self {
            Destination::Above(anchor) | Destination::Below(anchor) => anchor,
        }
    }

    /// Build from the two wire fields; empty strings count as absent.
    fn from_fields(above: &str, below: &str) -> Result<Option<Self>, PatchError> {
        match Placement::from_fields(above, below) {
            Placement::Unanchored => Ok(None),
            Placement::Anchored(destination) => Ok(Some(destination)),
            Placement::Conflicting { .. } => Err(PatchError::invalid(BOTH_DESTINATIONS)),
        }
    }
}

pub(crate) const BOTH_DESTINATIONS: &str =
    "cannot specify both destination_above and destination_below";

/// Destination fields of an insert, kept as written.
///
/// An insert into an empty document ignores its destination, so a
/// conflicting pair is only an error once the document is known to be
/// non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Unanchored,
    Anchored(Destination),
    Conflicting { above: String, below: String },
}

impl Placement {
    fn from_fields(above: &str, below: &str) -> Self {
        match (above.is_empty(), below.is_empty()) {
            (false, false) => Placement::Conflicting {
                above: above.to_string(),
                below: below.to_string(),
            },
            (false, true) => Placement::Anchored(Destination::Above(above.to_string())),
            (true, false) => Placement::Anchored(Destination::Below(below.to_string())),
            (true, true) => Placement::Unanchored,
        }
    }
}

impl From<Option<Destination>> for Placement {
    fn from(destination: Option<Destination>) -> Self {
        destination.map_or(Placement::Unanchored, Placement::Anchored)
    }
}

/// A single validated edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Replace {
        old: String,
        new: String,
        comment: Option<String>,
    },
    Delete {
        content: String,
        comment: Option<String>,
    },
    Move {
        content: String,
        destination: Destination,
        comment: Option<String>,
    },
    /// Only an empty document accepts a placement other than
    /// [`Placement::Anchored`].
    Insert {
        content: String,
        placement: Placement,
        comment: Option<String>,
    },
}

impl Change {
    pub fn replace(old: impl Into<String>, new: impl Into<String>) -> Self {
        Change::Replace {
            old: old.into(),
            new: new.into(),
            comment: None,
        }
    }

    pub fn delete(content: impl Into<String>) -> Self {
        Change::Delete {
            content: content.into(),
            comment: None,
        }
    }

    pub fn move_to(content: impl Into<String>, destination: Destination) -> Self {
        Change::Move {
            content: content.into(),
            destination,
            comment: None,
        }
    }

    pub fn insert(content: impl Into<String>, destination: Option<Destination>) -> Self {
        Change::Insert {
            content: content.into(),
            placement: destination.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        match &mut self {
            Change::Replace { comment, .. }
            | Change::Delete { comment, .. }
            | Change::Move { comment, .. }
            | Change::Insert { comment, .. } => *comment = text,
        }
        self
    }

    pub fn action(&self) -> Action {
        match self {
            Change::Replace { .. } => Action::Replace,
            Change::Delete { .. } => Action::Delete,
            Change::Move { .. } => Action::Move,
            Change::Insert { .. } => Action::Insert,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Change::Replace { comment, .. }
            | Change::Delete { comment, .. }
            | Change::Move { comment, .. }
            | Change::Insert { comment, .. } => comment.as_deref(),
        }
    }

    /// The text this change searches for (or inserts, for `Insert`).
    pub fn primary_text(&self) -> &str {
        match self {
            Change::Replace { old, .. } => old,
            Change::Delete { content, .. }
            | Change::Move { content, .. }
            | Change::Insert { content, .. } => content,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Replace,
    Delete,
    Move,
    Insert,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Replace => "replace",
            Action::Delete => "delete",
            Action::Move => "move",
            Action::Insert => "insert",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire form of a change. Absent fields deserialize as empty strings.
///
/// `action` is kept as a plain string so an unknown action is reported as
/// an invalid change rather than a parse failure of the whole file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawChange {
    pub comment: String,
    pub action: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub old: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub new: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub destination_above: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub destination_below: String,
}

impl TryFrom<&RawChange> for Change {
    type Error = PatchError;

    fn try_from(raw: &RawChange) -> Result<Self, Self::Error> {
        let comment = (!raw.comment.is_empty()).then(|| raw.comment.clone());
        let change = match raw.action.as_str() {
            "replace" => Change::Replace {
                old: raw.old.clone(),
                new: raw.new.clone(),
                comment,
            },
            "delete" => Change::Delete {
                content: raw.content.clone(),
                comment,
            },
            "move" => {
                let destination =
                    Destination::from_fields(&raw.destination_above, &raw.destination_below)?
                        .ok_or_else(|| {
                            PatchError::invalid(
                                "move requires destination_above or destination_below",
                            )
                        })?;
                Change::Move {
                    content: raw.content.clone(),
                    destination,
                    comment,
                }
            }
            "insert" => Change::Insert {
                content: raw.content.clone(),
                placement: Placement::from_fields(&raw.destination_above, &raw.destination_below),
                comment,
            },
            other => {
                return Err(PatchError::invalid(format!(
                    "unsupported action {other:?}"
                )))
            }
        };
        Ok(change)
    }
}

impl TryFrom<RawChange> for Change {
    type Error = PatchError;

    fn try_from(raw: RawChange) -> Result<Self, Self::Error> {
        Change::try_from(&raw)
    }
}

impl From<&Change> for RawChange {
    fn from(change: &Change) -> Self {
        let mut raw = RawChange {
            comment: change.comment().unwrap_or_default().to_string(),
            action: change.action().as_str().to_string(),
            ..RawChange::default()
        };
        let destination = match change {
            Change::Replace { old, new, .. } => {
                raw.old = old.clone();
                raw.new = new.clone();
                None
            }
            Change::Delete { content, .. } => {
                raw.content = content.clone();
                None
            }
            Change::Move {
                content,
                destination,
                ..
            } => {
                raw.content = content.clone();
                Some(destination)
            }
            Change::Insert {
                content, placement, ..
            } => {
                raw.content = content.clone();
                match placement {
                    Placement::Unanchored => None,
                    Placement::Anchored(destination) => Some(destination),
                    Placement::Conflicting { above, below } => {
                        raw.destination_above = above.clone();
                        raw.destination_below = below.clone();
                        None
                    }
                }
            }
        };
        match destination {
            Some(Destination::Above(anchor)) => raw.destination_above = anchor.clone(),
            Some(Destination::Below(anchor)) => raw.destination_below = anchor.clone(),
            None => {}
        }
        raw
    }
}
