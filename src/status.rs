//! Three-way status (§9 "Staged-diff semantics"): staged changes are
//! `diff(HEAD tree, index)`, unstaged changes are `diff(index, working
//! tree)`, and untracked files are anything on disk that is in neither and
//! isn't ignored.

use std::collections::BTreeSet;
use std::path::Path;

use walkdir::WalkDir;

use crate::branch;
use crate::error::Result;
use crate::ignore::IgnoreRules;
use crate::index::IndexEntry;
use crate::path::RepoPath;
use crate::refs::RefStore;
use crate::store::ObjectStore;
use crate::tree_analyzer::{self, Operation};
use crate::validator::{self, Modification};

/// A path whose working-tree contents no longer match what's staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnstagedChange {
    Modified(RepoPath),
    Deleted(RepoPath),
}

#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    /// `diff(HEAD tree, index)` — what the next commit would record.
    pub staged: Vec<Operation>,
    /// `diff(index, working tree)` — what `add` would pick up.
    pub unstaged: Vec<UnstagedChange>,
    /// On disk, not in the index, and not ignored.
    pub untracked: Vec<RepoPath>,
}

impl StatusReport {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }
}

pub fn compute(
    repo_root: &Path,
    meta_dir: &Path,
    store: &ObjectStore,
    refs: &RefStore,
    entries: &[IndexEntry],
    worker_count: usize,
) -> Result<StatusReport> {
    let head_map = match branch::current_commit(refs)? {
        Some(commit_hash) => {
            let commit = store.read(&commit_hash)?.as_commit()?.clone();
            tree_analyzer::flatten_tree(store, &commit.tree)?
        }
        None => tree_analyzer::FileMap::new(),
    };
    let index_map = tree_analyzer::flatten_index(entries)?;
    let (staged, _) = tree_analyzer::diff(&head_map, &index_map);

    let classifications = validator::classify_many(entries, repo_root, worker_count);
    let mut unstaged = Vec::new();
    for (entry, modification) in entries.iter().zip(classifications) {
        match modification {
            Modification::Deleted => unstaged.push(UnstagedChange::Deleted(entry.path.clone())),
            Modification::SizeChanged | Modification::ContentChanged => {
                unstaged.push(UnstagedChange::Modified(entry.path.clone()))
            }
            Modification::TimeChanged | Modification::Clean => {}
        }
    }

    let tracked: BTreeSet<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    let untracked = find_untracked(repo_root, meta_dir, &tracked)?;

    Ok(StatusReport {
        staged,
        unstaged,
        untracked,
    })
}

/// Walk the working directory, skipping the metadata directory and
/// anything matched by `.ritignore`, and collect every file not already
/// tracked by the index.
fn find_untracked(repo_root: &Path, meta_dir: &Path, tracked: &BTreeSet<&str>) -> Result<Vec<RepoPath>> {
    let rules = crate::ignore::load_ignore_rules(repo_root)?;
    let mut untracked = Vec::new();

    let walker = WalkDir::new(repo_root).into_iter().filter_entry(|entry| {
        let path = entry.path();
        if path == repo_root {
            return true;
        }
        if path == meta_dir {
            return false;
        }
        let relative = match path.strip_prefix(repo_root) {
            Ok(r) => r,
            Err(_) => return true,
        };
        let relative_str = relative.to_string_lossy().replace('\\', "/");
        !rules.is_ignored(&relative_str, entry.file_type().is_dir())
    });

    for entry in walker {
        let entry = entry.map_err(|e| crate::error::Error::corrupt(format!("walking working tree: {}", e)))?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = entry.path().strip_prefix(repo_root).unwrap_or(entry.path());
        let repo_path = RepoPath::from_relative(relative)?;
        if !tracked.contains(repo_path.as_str()) {
            untracked.push(repo_path);
        }
    }

    untracked.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    Ok(untracked)
}
