//! # Add Command
//!
//! Stage files for the next commit.
//!
//! ## Usage
//!
//! ```bash
//! rit add file.txt
//! rit add file1.txt file2.txt
//! rit add .
//! rit add -A
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::index::AddOutcome;
use crate::ignore;
use crate::path::RepoPath;
use crate::Repository;

/// Expand `path` into a flat list of `(RepoPath, absolute fs path)` pairs,
/// walking directories and skipping the metadata directory, the ignore
/// file itself, and anything `.ritignore` excludes.
fn expand_path(repo: &Repository, path: &Path, ignore_rules: &ignore::IgnoreRules) -> Result<Vec<(RepoPath, PathBuf)>> {
    let mut out = Vec::new();

    if !path.exists() {
        anyhow::bail!("path does not exist: {}", path.display());
    }

    for entry in WalkDir::new(path).into_iter().filter_entry(|e| {
        let rel = match e.path().strip_prefix(&repo.root) {
            Ok(r) => r,
            Err(_) => return true,
        };
        if rel.as_os_str().is_empty() {
            return true;
        }
        if rel.starts_with(".rit") {
            return false;
        }
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        !ignore_rules.is_ignored(&rel_str, e.file_type().is_dir())
    }) {
        let entry = entry.context("walking path to stage")?;
        if !entry.file_type().is_file() && !entry.file_type().is_symlink() {
            continue;
        }
        let relative = entry.path().strip_prefix(&repo.root).unwrap_or(entry.path());
        if relative.to_string_lossy() == ignore::IGNORE_FILE_NAME {
            continue;
        }
        let repo_path = RepoPath::from_relative(relative)?;
        out.push((repo_path, entry.path().to_path_buf()));
    }

    Ok(out)
}

pub fn run(paths: Vec<String>) -> Result<()> {
    let repo = Repository::find()?;
    let index = repo.index()?;
    let store = repo.store();
    let ignore_rules = ignore::load_ignore_rules(&repo.root)?;

    let mut staged = Vec::new();
    for raw in &paths {
        let path = PathBuf::from(raw);
        let full_path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()?.join(&path)
        };
        staged.extend(expand_path(&repo, &full_path, &ignore_rules)?);
    }

    let results = index.add(&staged, &store)?;
    for (path, outcome) in results {
        if let AddOutcome::Failed(message) = outcome {
            eprintln!("error: failed to add '{}': {}", path, message);
        }
    }

    Ok(())
}
