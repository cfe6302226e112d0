//! Change-set runner - applies a loaded change set to its target file
//!
//! This module ties the pure engine to the filesystem:
//! - Resolves the target path against a base directory
//! - Applies every change in order, stopping at the first failure
//! - Reports an outcome for each change
//! - Writes the result back atomically unless running in check mode

use crate::apply::apply;
use crate::change::{Action, Change};
use crate::config::schema::ChangeSet;
use crate::document::Document;
use crate::errors::PatchError;
use crate::output::{atomic_write, OutputError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Write the patched document back to the target file.
    Write,
    /// Compute the result without touching the filesystem.
    Check,
}

/// What happened to a single change of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "ChangeOutcome should be checked for success/failure"]
pub enum ChangeOutcome {
    Applied,
    Failed { error: PatchError },
    /// An earlier change failed, so this one was never tried.
    NotAttempted,
}

impl ChangeOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ChangeOutcome::Applied)
    }
}

impl fmt::Display for ChangeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeOutcome::Applied => write!(f, "applied"),
            ChangeOutcome::Failed { error } => write!(f, "failed: {}", error),
            ChangeOutcome::NotAttempted => write!(f, "not attempted"),
        }
    }
}

/// Result of running one change set against its target.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub file: PathBuf,
    /// One entry per change, in change-set order.
    pub outcomes: Vec<(Option<String>, ChangeOutcome)>,
    pub original: String,
    /// Text after the last successful change.
    pub patched: String,
    /// Lines after the last successful change. Unlike re-parsing `patched`,
    /// this keeps a trailing empty line when the target had no final newline.
    pub lines: Vec<String>,
    /// Whether `patched` was written to `file`.
    pub written: bool,
}

impl RunReport {
    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_applied()).count()
    }

    pub fn failure(&self) -> Option<(usize, &PatchError)> {
        self.outcomes
            .iter()
            .enumerate()
            .find_map(|(idx, (_, outcome))| match outcome {
                ChangeOutcome::Failed { error } => Some((idx, error)),
                _ => None,
            })
    }

    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }

    pub fn is_modified(&self) -> bool {
        self.original != self.patched
    }
}

/// Errors that prevent a change set from being run at all.
#[derive(Debug)]
pub enum RunError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Output {
        path: PathBuf,
        source: OutputError,
    },
    /// A change failed conversion. Loaded change sets are validated, so this
    /// only happens for sets built in code.
    InvalidChange { index: usize, source: PatchError },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            RunError::Output { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            RunError::InvalidChange { index, source } => {
                write!(f, "change #{}: {}", index + 1, source)
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Io { source, .. } => Some(source),
            RunError::Output { source, .. } => Some(source),
            RunError::InvalidChange { source, .. } => Some(source),
        }
    }
}

/// Resolve a change set's target path. Relative paths are taken relative to
/// `base_dir`.
pub fn resolve_target(set: &ChangeSet, base_dir: &Path) -> PathBuf {
    let path = Path::new(&set.path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Apply a change set to its target file.
///
/// A missing target file is treated as an empty document when every change
/// is an insert, so such a set can create the file; for any other set it is
/// an I/O error. In [`RunMode::Write`] the file is only written when every
/// change applied and the content changed; a failing set leaves the file
/// untouched.
pub fn run_change_set(
    set: &ChangeSet,
    base_dir: &Path,
    mode: RunMode,
) -> Result<RunReport, RunError> {
    run_change_set_from(set, base_dir, mode, None)
}

/// [`run_change_set`] starting from `starting_text` instead of the file's
/// current content.
///
/// Lets a caller running several sets against one target in
/// [`RunMode::Check`] feed each set the result of the previous one, as a
/// real run would see it on disk.
pub fn run_change_set_from(
    set: &ChangeSet,
    base_dir: &Path,
    mode: RunMode,
    starting_text: Option<&str>,
) -> Result<RunReport, RunError> {
    let file = resolve_target(set, base_dir);

    let changes: Vec<Change> = set
        .changes
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            Change::try_from(raw).map_err(|source| RunError::InvalidChange { index, source })
        })
        .collect::<Result<_, _>>()?;

    let original = match starting_text {
        Some(text) => text.to_owned(),
        None => read_target(&file, &changes)?,
    };

    let document = Document::parse(&original);
    let mut current = document.lines().to_vec();
    let mut outcomes = Vec::with_capacity(changes.len());
    let mut failed = false;

    for change in &changes {
        let comment = change.comment().map(str::to_owned);
        if failed {
            outcomes.push((comment, ChangeOutcome::NotAttempted));
            continue;
        }
        match apply(&current, change) {
            Ok(next) => {
                current = next;
                outcomes.push((comment, ChangeOutcome::Applied));
            }
            Err(error) => {
                info!(file = %file.display(), %error, "change failed; stopping");
                failed = true;
                outcomes.push((comment, ChangeOutcome::Failed { error }));
            }
        }
    }

    let patched = document.with_lines(current.clone()).render();
    let written = mode == RunMode::Write && !failed && patched != original;
    if written {
        atomic_write(&file, patched.as_bytes()).map_err(|source| RunError::Output {
            path: file.clone(),
            source,
        })?;
        info!(file = %file.display(), "wrote patched file");
    }

    Ok(RunReport {
        file,
        outcomes,
        original,
        patched,
        lines: current,
        written,
    })
}

fn read_target(file: &Path, changes: &[Change]) -> Result<String, RunError> {
    match fs::read_to_string(file) {
        Ok(text) => Ok(text),
        Err(source)
            if source.kind() == std::io::ErrorKind::NotFound
                && changes.iter().all(|c| c.action() == Action::Insert) =>
        {
            debug!(file = %file.display(), "target does not exist; starting from an empty document");
            Ok(String::new())
        }
        Err(source) => Err(RunError::Io {
            path: file.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::RawChange;

    fn raw(action: &str, fields: &[(&str, &str)]) -> RawChange {
        let mut change = RawChange {
            action: action.to_string(),
            ..RawChange::default()
        };
        for (key, value) in fields {
            let value = value.to_string();
            match *key {
                "comment" => change.comment = value,
                "old" => change.old = value,
                "new" => change.new = value,
                "content" => change.content = value,
                "destination_above" => change.destination_above = value,
                "destination_below" => change.destination_below = value,
                other => panic!("unknown field {other}"),
            }
        }
        change
    }

    #[test]
    fn test_resolve_target() {
        let set = ChangeSet {
            path: "src/lib.rs".to_string(),
            changes: vec![],
        };
        assert_eq!(
            resolve_target(&set, Path::new("/work")),
            PathBuf::from("/work/src/lib.rs")
        );
    }

    #[test]
    fn test_run_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "one\ntwo\nthree\n").unwrap();
        let set = ChangeSet {
            path: "notes.txt".to_string(),
            changes: vec![
                raw("replace", &[("old", "two"), ("new", "2")]),
                raw("move", &[("content", "one"), ("destination_below", "three")]),
            ],
        };

        let report = run_change_set(&set, dir.path(), RunMode::Write).unwrap();

        assert!(report.is_success());
        assert!(report.written);
        assert_eq!(report.applied_count(), 2);
        let text = fs::read_to_string(dir.path().join("notes.txt")).unwrap();
        assert_eq!(text, "2\nthree\none\n");
    }

    #[test]
    fn test_check_mode_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "one\n").unwrap();
        let set = ChangeSet {
            path: "notes.txt".to_string(),
            changes: vec![raw("replace", &[("old", "one"), ("new", "uno")])],
        };

        let report = run_change_set(&set, dir.path(), RunMode::Check).unwrap();

        assert!(!report.written);
        assert_eq!(report.patched, "uno\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
            "one\n"
        );
    }

    #[test]
    fn test_failure_stops_and_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "a\nb\n").unwrap();
        let set = ChangeSet {
            path: "notes.txt".to_string(),
            changes: vec![
                raw("delete", &[("content", "a")]),
                raw("delete", &[("content", "zzz"), ("comment", "missing")]),
                raw("delete", &[("content", "b")]),
            ],
        };

        let report = run_change_set(&set, dir.path(), RunMode::Write).unwrap();

        assert!(!report.written);
        let (idx, error) = report.failure().unwrap();
        assert_eq!(idx, 1);
        assert!(error.is_not_found());
        assert_eq!(report.outcomes[1].0.as_deref(), Some("missing"));
        assert_eq!(report.outcomes[2].1, ChangeOutcome::NotAttempted);
        assert_eq!(report.patched, "b\n");
        assert_eq!(fs::read_to_string(dir.path().join("notes.txt")).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_missing_target_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = ChangeSet {
            path: "new.txt".to_string(),
            changes: vec![raw("insert", &[("content", "hello\nworld")])],
        };

        let report = run_change_set(&set, dir.path(), RunMode::Write).unwrap();

        assert!(report.written);
        assert_eq!(
            fs::read_to_string(dir.path().join("new.txt")).unwrap(),
            "hello\nworld"
        );
    }

    #[test]
    fn test_missing_target_with_non_insert_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let set = ChangeSet {
            path: "typo.txt".to_string(),
            changes: vec![
                raw("insert", &[("content", "x")]),
                raw("replace", &[("old", "a"), ("new", "b")]),
            ],
        };

        let err = run_change_set(&set, dir.path(), RunMode::Check).unwrap_err();

        match err {
            RunError::Io { path, source } => {
                assert_eq!(path, dir.path().join("typo.txt"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected I/O error, got {other}"),
        }
    }

    #[test]
    fn test_starting_text_replaces_file_content() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("t.txt"), "a\nb\n").unwrap();
        let set = ChangeSet {
            path: "t.txt".to_string(),
            changes: vec![raw("replace", &[("old", "X"), ("new", "Y")])],
        };

        let report =
            run_change_set_from(&set, dir.path(), RunMode::Check, Some("a\nX\nb\n")).unwrap();

        assert!(report.is_success());
        assert_eq!(report.original, "a\nX\nb\n");
        assert_eq!(report.patched, "a\nY\nb\n");
        assert_eq!(fs::read_to_string(dir.path().join("t.txt")).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_report_lines_keep_trailing_empty_line() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("t.txt"), "a\nb").unwrap();
        let set = ChangeSet {
            path: "t.txt".to_string(),
            changes: vec![
                raw("replace", &[("old", "b"), ("new", "b\n")]),
                raw("delete", &[("content", "missing")]),
            ],
        };

        let report = run_change_set(&set, dir.path(), RunMode::Check).unwrap();

        assert!(!report.is_success());
        assert_eq!(report.patched, "a\nb\n");
        assert_eq!(report.lines, ["a", "b", ""]);
        assert_ne!(Document::parse(&report.patched).into_lines(), report.lines);
    }

    #[test]
    fn test_invalid_change_in_code_built_set() {
        let dir = tempfile::tempdir().unwrap();
        let set = ChangeSet {
            path: "x.txt".to_string(),
            changes: vec![raw("teleport", &[])],
        };
        let err = run_change_set(&set, dir.path(), RunMode::Check).unwrap_err();
        assert!(matches!(err, RunError::InvalidChange { index: 0, .. }));
    }
}
