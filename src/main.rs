use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use differential::config::{
    load_from_path, resolve_target, run_change_set_from, ChangeOutcome, ChangeSet, RunMode,
    RunReport,
};
use differential::document::split_block;
use differential::hint::hint_for;
use differential::output::{unified_diff, DiffStat};
use differential::PatchError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "differential")]
#[command(
    about = "Apply structured replace/delete/move/insert changes to text files",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply change sets to their target files
    Apply {
        #[command(flatten)]
        target: TargetArgs,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Check that change sets apply cleanly, without writing
    Check {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List the changes in change-set files
    Show {
        /// Change-set files or directories containing them
        #[arg(required = true)]
        changes: Vec<PathBuf>,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Change-set files (.json or .toml) or directories containing them
    #[arg(required = true)]
    changes: Vec<PathBuf>,

    /// Directory that relative target paths are resolved against
    #[arg(short, long, default_value = ".")]
    base_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Apply {
            target,
            dry_run,
            diff,
        } => {
            let mode = if dry_run { RunMode::Check } else { RunMode::Write };
            cmd_apply(&target, mode, diff)
        }

        Commands::Check { target } => cmd_apply(&target, RunMode::Check, false),

        Commands::Show { changes } => cmd_show(&changes),
    }
}

/// Logs go to stderr so they never mix with diff output.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Expand directories into the change-set files directly inside them.
///
/// Only `.json` and `.toml` files are picked up, sorted by name so a
/// directory of numbered change sets applies in a predictable order.
fn discover_change_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input).max_depth(1) {
            let entry = entry?;
            let is_change_set = matches!(
                entry.path().extension().and_then(|s| s.to_str()),
                Some("json") | Some("toml")
            );
            if entry.file_type().is_file() && is_change_set {
                found.push(entry.path().to_path_buf());
            }
        }
        found.sort();

        if found.is_empty() {
            anyhow::bail!("No .json or .toml change sets found in {}", input.display());
        }
        files.extend(found);
    }

    Ok(files)
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    let diff = unified_diff(&file.display().to_string(), original, modified);
    for line in diff.lines() {
        let colored = if line.starts_with("---") || line.starts_with("+++") {
            line.dimmed()
        } else if line.starts_with("@@") {
            line.cyan()
        } else if line.starts_with('-') {
            line.red()
        } else if line.starts_with('+') {
            line.green()
        } else {
            line.normal()
        };
        println!("{}", colored);
    }
}

fn describe(index: usize, comment: Option<&str>) -> String {
    match comment {
        Some(comment) => format!("#{} ({})", index + 1, comment),
        None => format!("#{}", index + 1),
    }
}

/// Print the per-change lines of one run and return the number of failures.
fn report_run(report: &RunReport, dry_run: bool) -> usize {
    let mut failed = 0;

    for (index, (comment, outcome)) in report.outcomes.iter().enumerate() {
        let label = describe(index, comment.as_deref());
        match outcome {
            ChangeOutcome::Applied => {
                let verb = if dry_run { "Would apply" } else { "Applied" };
                println!("{} {}: {}", "✓".green(), label, verb);
            }
            ChangeOutcome::Failed { error } => {
                failed += 1;
                eprintln!("{} {}: Error - {}", "✗".red(), label, error);
                print_conflict_help(&report.lines, error);
            }
            ChangeOutcome::NotAttempted => {
                println!("{} {}: Not attempted", "⊘".cyan(), label);
            }
        }
    }

    failed
}

fn print_conflict_help(document: &[String], error: &PatchError) {
    match error {
        PatchError::BlockNotFound { role, .. } => {
            eprintln!(
                "  {}",
                format!("CONFLICT: '{}' block not found", role).red()
            );
            match hint_for(document, error) {
                Some(near) => {
                    eprintln!(
                        "  Closest line {} ({:.0}% similar): {:?}",
                        near.index + 1,
                        near.similarity * 100.0,
                        near.line
                    );
                }
                None => eprintln!("  No similar line in the document"),
            }
            eprintln!("  Blocks must match line for line, including whitespace");
        }
        PatchError::InvalidChange { .. } => {
            eprintln!("  Action: Fix the change definition");
        }
    }
}

fn cmd_apply(target: &TargetArgs, mode: RunMode, show_diff: bool) -> Result<()> {
    let dry_run = mode == RunMode::Check;
    let files = discover_change_files(&target.changes)?;

    if dry_run {
        println!("{}", "[DRY RUN - no files will be modified]".cyan());
        println!();
    }

    let mut total_applied = 0;
    let mut total_failed = 0;
    let mut files_changed = 0;
    // Nothing is written in check mode, so later sets for the same target
    // start from here instead of the file.
    let mut patched: HashMap<PathBuf, String> = HashMap::new();

    for change_file in files {
        println!("Loading changes from {}...", change_file.display());

        let set = load_from_path(&change_file)?;
        let starting_text = patched
            .get(&resolve_target(&set, &target.base_dir))
            .map(String::as_str);
        let report = run_change_set_from(&set, &target.base_dir, mode, starting_text)
            .with_context(|| format!("failed to run {}", change_file.display()))?;
        if report.is_success() {
            patched.insert(report.file.clone(), report.patched.clone());
        }

        println!("Target: {}", report.file.display());
        total_applied += report.applied_count();
        total_failed += report_run(&report, dry_run);

        if report.is_success() && report.is_modified() {
            files_changed += 1;
            let stat = DiffStat::between(&report.original, &report.patched);
            println!(
                "  {} lines, {} lines",
                format!("-{}", stat.removed).red(),
                format!("+{}", stat.added).green()
            );
            if show_diff {
                display_diff(&report.file, &report.original, &report.patched);
            }
        }

        println!();
    }

    println!("{}", "Summary:".bold());
    println!("  {} applied", format!("{}", total_applied).green());
    println!("  {} failed", format!("{}", total_failed).red());
    let verb = if dry_run { "would change" } else { "changed" };
    println!("  {} files {}", files_changed, verb);

    if total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_show(inputs: &[PathBuf]) -> Result<()> {
    for change_file in discover_change_files(inputs)? {
        let set: ChangeSet = load_from_path(&change_file)?;
        let target = resolve_target(&set, Path::new("."));

        println!("{}", change_file.display().to_string().bold());
        println!("  Target: {}", target.display());

        for (index, change) in set.parsed_changes()?.iter().enumerate() {
            let label = describe(index, change.comment());
            let block = split_block(change.primary_text());
            let line_count = block.len();
            println!(
                "  {} {} {:?} ({} line{})",
                label,
                change.action().as_str().bold(),
                block[0],
                line_count,
                if line_count == 1 { "" } else { "s" }
            );
        }
        println!();
    }

    Ok(())
}

