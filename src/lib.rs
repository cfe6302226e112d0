//! Differential: line-oriented patch engine
//!
//! Applies structured changes (replace / delete / move / insert) to a
//! document held as an ordered sequence of lines. Every change locates its
//! blocks by exact content, never by line number, so a change set stays
//! valid while the surrounding file drifts.
//!
//! # Architecture
//!
//! - [`matcher`]: KMP search for a block of lines inside a document
//! - [`apply`]: one change in, one new document out; batches run strictly
//!   in order, each change seeing the result of the previous one
//! - [`config`]: change-set files (JSON or TOML), validation, and a runner
//!   that applies a set to its target file
//!
//! The engine is pure. Only [`config::runner`] and [`output`] touch the
//! filesystem.
//!
//! # Example
//!
//! ```
//! use differential::{apply, Change, Destination};
//!
//! let doc: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
//! let doc = apply(&doc, &Change::replace("a\nb", "x\ny\nz")).unwrap();
//! assert_eq!(doc, ["x", "y", "z", "c"]);
//!
//! let doc = apply(&doc, &Change::move_to("c", Destination::Above("x".into()))).unwrap();
//! assert_eq!(doc, ["c", "x", "y", "z"]);
//! ```

pub mod apply;
pub mod change;
pub mod config;
pub mod document;
pub mod errors;
pub mod hint;
pub mod matcher;
pub mod output;

// Re-exports
pub use apply::{apply, apply_all, apply_raw, apply_raw_all, resolve_destination};
pub use change::{Action, Change, Destination, Placement, RawChange};
pub use config::{
    load_from_path, load_from_str, run_change_set, ChangeOutcome, ChangeSet, ConfigError, Format,
    RunError, RunMode, RunReport,
};
pub use document::{split_block, Document};
pub use errors::{BatchError, BlockRole, PatchError};
pub use matcher::{find, Pattern};
