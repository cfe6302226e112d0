//! Integration tests for change-set loading and application
//!
//! Tests the DSL loaders, batch semantics, and file-level runs

use differential::config::{
    load_from_path, load_from_str, run_change_set, ChangeOutcome, ConfigError, Format, RunMode,
};
use differential::{apply_all, apply_raw_all, BlockRole, Change, Destination, PatchError};
use std::fs;
use tempfile::TempDir;

/// Helper to create a temp dir with a target file
fn setup_test_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();

    fs::write(
        dir.path().join("main.go"),
        r#"package main

import "fmt"

func helper() {
	fmt.Println("helper")
}

func main() {
	fmt.Println("Hello")
}
"#,
    )
    .unwrap();

    dir
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_load_change_set_json() {
    let json = r#"{
  "path": "main.go",
  "changes": [
    {
      "comment": "Greet the world",
      "action": "replace",
      "old": "\tfmt.Println(\"Hello\")",
      "new": "\tfmt.Println(\"Hello, world\")"
    },
    {
      "comment": "Helper goes last",
      "action": "move",
      "content": "func helper() {\n\tfmt.Println(\"helper\")\n}\n",
      "destination_below": "\tfmt.Println(\"Hello, world\")\n}"
    }
  ]
}"#;

    let set = load_from_str(json, Format::Json).expect("Failed to parse change set");

    assert_eq!(set.path, "main.go");
    assert_eq!(set.changes.len(), 2);
    assert_eq!(set.changes[0].comment, "Greet the world");
    assert_eq!(set.changes[1].destination_above, "");

    let changes = set.parsed_changes().unwrap();
    assert!(matches!(
        &changes[1],
        Change::Move {
            destination: Destination::Below(_),
            ..
        }
    ));
}

#[test]
fn test_load_change_set_toml_multiline() {
    let toml = r#"
path = "main.go"

[[changes]]
comment = "drop helper"
action = "delete"
content = """
func helper() {
	fmt.Println("helper")
}"""
"#;

    let set = load_from_str(toml, Format::Toml).expect("Failed to parse change set");
    assert_eq!(
        set.changes[0].content,
        "func helper() {\n\tfmt.Println(\"helper\")\n}"
    );
}

#[test]
fn test_load_rejects_conflicting_move_destinations() {
    let json = r#"{"path": "a.txt", "changes": [
        {"action": "move", "content": "x", "destination_above": "a", "destination_below": "b"}
    ]}"#;

    let err = load_from_str(json, Format::Json).unwrap_err();
    match err {
        ConfigError::Validation { source, .. } => {
            assert_eq!(source.issues.len(), 1);
            assert!(source.to_string().contains("cannot specify both"));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn test_load_from_path_by_extension() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("changes.toml");
    fs::write(
        &file,
        "path = \"x.txt\"\n\n[[changes]]\naction = \"delete\"\ncontent = \"x\"\n",
    )
    .unwrap();

    let set = load_from_path(&file).unwrap();
    assert_eq!(set.path, "x.txt");
}

#[test]
fn test_full_file_run() {
    let workspace = setup_test_workspace();
    let json = r#"{"path": "main.go", "changes": [
        {"action": "replace", "old": "\tfmt.Println(\"Hello\")", "new": "\tfmt.Println(\"Hello, world\")"},
        {"action": "move", "content": "func helper() {\n\tfmt.Println(\"helper\")\n}\n",
         "destination_below": "\tfmt.Println(\"Hello, world\")\n}"},
        {"action": "insert", "content": "", "destination_above": "func helper() {"}
    ]}"#;
    let set = load_from_str(json, Format::Json).unwrap();

    let report = run_change_set(&set, workspace.path(), RunMode::Write).unwrap();

    assert!(report.is_success(), "{:?}", report.outcomes);
    assert!(report.written);
    let content = fs::read_to_string(workspace.path().join("main.go")).unwrap();
    assert_eq!(
        content,
        r#"package main

import "fmt"

func main() {
	fmt.Println("Hello, world")
}

func helper() {
	fmt.Println("helper")
}

"#
    );
}

#[test]
fn test_failed_run_reports_every_change() {
    let workspace = setup_test_workspace();
    let json = r#"{"path": "main.go", "changes": [
        {"comment": "first", "action": "delete", "content": "import \"fmt\""},
        {"comment": "second", "action": "replace", "old": "func Main() {", "new": "x"},
        {"comment": "third", "action": "delete", "content": "package main"}
    ]}"#;
    let set = load_from_str(json, Format::Json).unwrap();
    let before = fs::read_to_string(workspace.path().join("main.go")).unwrap();

    let report = run_change_set(&set, workspace.path(), RunMode::Write).unwrap();

    assert!(!report.is_success());
    assert!(report.outcomes[0].1.is_applied());
    assert!(matches!(
        &report.outcomes[1].1,
        ChangeOutcome::Failed {
            error: PatchError::BlockNotFound {
                role: BlockRole::Old,
                ..
            }
        }
    ));
    assert_eq!(report.outcomes[2].1, ChangeOutcome::NotAttempted);
    assert!(!report.patched.contains("import \"fmt\""));

    // Nothing written on failure.
    let after = fs::read_to_string(workspace.path().join("main.go")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_batch_later_change_uses_earlier_insert_as_anchor() {
    let doc = lines(&["alpha", "omega"]);
    let changes = vec![
        Change::insert("middle", Some(Destination::Below("alpha".into()))),
        Change::move_to("omega", Destination::Above("middle".into())),
    ];

    let out = apply_all(&doc, &changes).unwrap();
    assert_eq!(out, ["alpha", "omega", "middle"]);
}

#[test]
fn test_batch_error_keeps_last_good_state() {
    let doc = lines(&["a", "b", "c"]);
    let set = load_from_str(
        r#"{"path": "x", "changes": [
            {"action": "delete", "content": "b"},
            {"action": "move", "content": "a", "destination_below": "b"}
        ]}"#,
        Format::Json,
    )
    .unwrap();

    let err = apply_raw_all(&doc, &set.changes).unwrap_err();
    assert_eq!(err.index, 1);
    assert_eq!(
        err.error,
        PatchError::BlockNotFound {
            role: BlockRole::DestinationBelow,
            first_line: "b".into(),
        }
    );
    assert_eq!(err.document, ["a", "c"]);
}
