pub mod loader;
pub mod runner;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError, Format};
pub use runner::{
    resolve_target, run_change_set, run_change_set_from, ChangeOutcome, RunError, RunMode,
    RunReport,
};
pub use schema::{ChangeSet, ValidationError, ValidationIssue};
