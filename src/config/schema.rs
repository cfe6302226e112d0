use crate::change::{Change, RawChange};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A change-set document: the file to edit and the ordered changes to apply
/// to it.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub changes: Vec<RawChange>,
}

impl ChangeSet {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.path.trim().is_empty() {
            issues.push(ValidationIssue::MissingPath);
        }
        if self.changes.is_empty() {
            issues.push(ValidationIssue::EmptyChangeList);
        }

        for (index, raw) in self.changes.iter().enumerate() {
            if raw.action.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    index,
                    field: "action",
                });
                continue;
            }
            if let Err(err) = Change::try_from(raw) {
                issues.push(ValidationIssue::InvalidChange {
                    index,
                    comment: (!raw.comment.is_empty()).then(|| raw.comment.clone()),
                    message: err.to_string(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Validated changes, in order. Call after [`ChangeSet::validate`]
    /// succeeded; any change that still fails conversion is returned as an
    /// error.
    pub fn parsed_changes(&self) -> Result<Vec<Change>, crate::PatchError> {
        self.changes.iter().map(Change::try_from).collect()
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    MissingPath,
    EmptyChangeList,
    MissingField {
        index: usize,
        field: &'static str,
    },
    InvalidChange {
        index: usize,
        comment: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingPath => write!(f, "change set missing required field 'path'"),
            ValidationIssue::EmptyChangeList => write!(f, "change set contains no changes"),
            ValidationIssue::MissingField { index, field } => {
                write!(f, "change #{} missing required field '{field}'", index + 1)
            }
            ValidationIssue::InvalidChange {
                index,
                comment,
                message,
            } => match comment {
                Some(comment) => write!(f, "change #{} ({comment}): {message}", index + 1),
                None => write!(f, "change #{}: {message}", index + 1),
            },
        }
    }
}
