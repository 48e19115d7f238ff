//! Command-line entry point for `rit`.
//!
//! Parses arguments with `clap`, installs a `tracing-subscriber` that
//! listens on `RIT_LOG` (falling back to `info`), and dispatches to the
//! `commands` module. Exit codes: `0` on success, `1` for user-facing
//! errors (bad arguments, missing objects, unmerged branches), `2` when
//! the error is classified as internal (corruption, a failed rollback).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rit::commands;
use rit::error::Error as RitError;

/// Rit - a Git-compatible local version-control engine
///
/// Created by Sudeep Ranjan Sahoo
/// GitHub: https://github.com/srs-sudeep
#[derive(Parser)]
#[command(name = "rit")]
#[command(author = "Sudeep Ranjan Sahoo <sudeep.ranjan.sahoo@example.com>")]
#[command(version = "0.2.0")]
#[command(about = "A Git-compatible local version-control engine", long_about = None)]
struct Cli {
    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (stacks: -v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new rit repository
    Init {
        /// Directory to initialize (defaults to the current directory)
        path: Option<PathBuf>,

        /// Name of the initial branch HEAD should point at
        #[arg(short = 'b', long = "initial-branch")]
        initial_branch: Option<String>,

        /// Create a bare repository (no working tree)
        #[arg(long)]
        bare: bool,
    },

    /// Add file contents to the staging area
    Add {
        /// Files or directories to stage
        #[arg(required_unless_present = "all")]
        paths: Vec<String>,

        /// Stage all tracked and untracked files in the repository
        #[arg(short = 'A', long = "all")]
        all: bool,
    },

    /// Record the staged index as a new commit
    Commit {
        /// The commit message
        #[arg(short, long)]
        message: String,
    },

    /// Show the working tree status
    Status {
        /// Short format (two-letter status codes)
        #[arg(short = 's', long = "short")]
        short: bool,
    },

    /// Show commit logs by walking the first-parent chain from HEAD
    Log {
        /// Limit the number of commits shown
        #[arg(short = 'n', long = "max-count")]
        limit: Option<usize>,

        /// Show one commit per line
        #[arg(long = "oneline")]
        oneline: bool,
    },

    /// List, create, rename, or delete branches
    Branch {
        /// Branch to create, or old name when renaming
        name: Option<String>,

        /// Commit or branch the new branch should start at (with a create)
        start_point: Option<String>,

        /// Delete the named branch (refuses if not merged)
        #[arg(short = 'd', long = "delete")]
        delete: bool,

        /// Force-delete the named branch, even if not merged
        #[arg(short = 'D')]
        force_delete: bool,

        /// Rename a branch: `rit branch -m <old> <new>`
        #[arg(short = 'm', long = "move")]
        rename: bool,

        /// Force a rename onto an existing branch name
        #[arg(short = 'M')]
        force_rename: bool,

        /// List branches (the default with no other flags)
        #[arg(long)]
        list: bool,
    },

    /// Switch the working directory, index, and HEAD to a branch or commit
    Checkout {
        /// Branch name, commit hash, or new branch name (with -b/--orphan)
        target: String,

        /// Create `target` as a new branch at HEAD before switching to it
        #[arg(short = 'b')]
        new_branch: bool,

        /// Detach HEAD at the given commit instead of following a branch
        #[arg(long)]
        detach: bool,

        /// Start a new, parentless branch history named `target`
        #[arg(long)]
        orphan: bool,

        /// Discard local changes that would otherwise block the checkout
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("RIT_LOG").unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .without_time()
        .init();

    match dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            match err.downcast_ref::<RitError>() {
                Some(rit_err) if rit_err.is_internal() => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}

fn dispatch(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init { path, initial_branch, bare } => {
            commands::init::run(path.as_deref(), initial_branch.as_deref(), bare)
        }

        Commands::Add { paths, all } => {
            let paths = if all { vec![".".to_string()] } else { paths };
            commands::add::run(paths)
        }

        Commands::Commit { message } => commands::commit::run(&message),

        Commands::Status { short } => commands::status::run(short),

        Commands::Log { limit, oneline } => commands::log::run(limit, oneline),

        Commands::Branch {
            name,
            start_point,
            delete,
            force_delete,
            rename,
            force_rename,
            list,
        } => {
            let repo = rit::Repository::find()?;
            if delete || force_delete {
                let name = name.ok_or_else(|| anyhow::anyhow!("branch name required"))?;
                commands::branch::delete(&repo, &name, force_delete)
            } else if rename || force_rename {
                let old = name.ok_or_else(|| anyhow::anyhow!("missing branch names for rename"))?;
                let new = start_point.ok_or_else(|| anyhow::anyhow!("missing new branch name for rename"))?;
                commands::branch::rename(&repo, &old, &new, force_rename)
            } else if list || name.is_none() {
                commands::branch::list(&repo)
            } else {
                let name = name.unwrap();
                commands::branch::create(&repo, &name, start_point.as_deref())
            }
        }

        Commands::Checkout { target, new_branch, detach, orphan, force } => {
            commands::checkout::run(commands::checkout::CheckoutArgs {
                target: &target,
                new_branch,
                detach,
                orphan,
                force,
            })
        }
    }
}
