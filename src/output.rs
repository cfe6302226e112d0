//! Writing patched documents back out.

use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("path has no parent directory: {0}")]
    NoParent(std::path::PathBuf),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the target is left as it was. Existing
/// file permissions are carried over to the replacement.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), OutputError> {
    // Same directory so the rename stays on one filesystem.
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return Err(OutputError::NoParent(path.to_path_buf())),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    if let Ok(meta) = fs::metadata(path) {
        temp.as_file().set_permissions(meta.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Counts of lines removed and added between two texts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStat {
    pub removed: usize,
    pub added: usize,
}

impl DiffStat {
    pub fn between(original: &str, modified: &str) -> Self {
        let diff = TextDiff::from_lines(original, modified);
        let mut stat = DiffStat::default();
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Delete => stat.removed += 1,
                ChangeTag::Insert => stat.added += 1,
                ChangeTag::Equal => {}
            }
        }
        stat
    }

    pub fn is_empty(&self) -> bool {
        self.removed == 0 && self.added == 0
    }
}

/// Unified diff with three lines of context, headers naming `label`.
pub fn unified_diff(label: &str, original: &str, modified: &str) -> String {
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(3)
        .header(&format!("{label} (original)"), &format!("{label} (patched)"))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_write_replaces_content() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        fs::write(&file_path, b"original content").unwrap();

        atomic_write(&file_path, b"modified content").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "modified content");
    }

    #[test]
    fn test_atomic_write_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("new.txt");

        atomic_write(&file_path, b"fresh").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "fresh");
    }

    #[test]
    fn test_diff_stat() {
        let stat = DiffStat::between("a\nb\nc\n", "a\nx\ny\nc\n");
        assert_eq!(stat, DiffStat { removed: 1, added: 2 });
        assert!(DiffStat::between("same\n", "same\n").is_empty());
    }

    #[test]
    fn test_unified_diff_headers() {
        let diff = unified_diff("notes.txt", "a\nb\n", "a\nc\n");
        assert!(diff.contains("--- notes.txt (original)"));
        assert!(diff.contains("+++ notes.txt (patched)"));
        assert!(diff.contains("-b"));
        assert!(diff.contains("+c"));
    }
}
