use std::fmt;
use thiserror::Error;

/// Which field of a change named the block that could not be located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    /// `old` of a replace.
    Old,
    /// `content` of a delete or move.
    Content,
    DestinationAbove,
    DestinationBelow,
}

impl BlockRole {
    pub fn field_name(self) -> &'static str {
        match self {
            BlockRole::Old => "old",
            BlockRole::Content => "content",
            BlockRole::DestinationAbove => "destination_above",
            BlockRole::DestinationBelow => "destination_below",
        }
    }
}

impl fmt::Display for BlockRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// A required block is not present in the current document. Not
    /// transient: the change text must be fixed to match exactly.
    #[error("specified {role} block not found in the source (first line: {first_line:?})")]
    BlockNotFound {
        role: BlockRole,
        first_line: String,
    },

    #[error("invalid change: {reason}")]
    InvalidChange { reason: String },
}

impl PatchError {
    pub(crate) fn not_found(role: BlockRole, block: &[String]) -> Self {
        PatchError::BlockNotFound {
            role,
            first_line: block.first().cloned().unwrap_or_default(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        PatchError::InvalidChange {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PatchError::BlockNotFound { .. })
    }

    pub fn is_invalid_change(&self) -> bool {
        matches!(self, PatchError::InvalidChange { .. })
    }
}

/// A batch stopped at its first failing change.
///
/// `document` is the state after the last change that succeeded, so callers
/// can keep partial progress or discard it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("change #{} failed: {error}", .index + 1)]
pub struct BatchError {
    /// Zero-based position of the failing change.
    pub index: usize,
    pub comment: Option<String>,
    #[source]
    pub error: PatchError,
    pub document: Vec<String>,
}
