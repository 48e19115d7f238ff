//! Flattens a commit's tree (or the current index) into a `path -> {hash,
//! mode}` map, and diffs two such maps into an ordered list of
//! create/modify/delete operations.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::hash::Hash;
use crate::index::IndexEntry;
use crate::objects::{FileMode, Tree};
use crate::path::RepoPath;
use crate::store::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileState {
    pub hash: Hash,
    pub mode: FileMode,
}

pub type FileMap = BTreeMap<RepoPath, FileState>;

/// Recursively enumerate every non-directory entry reachable from `tree`,
/// building a flat path map. Gitlink entries are skipped — submodules are
/// out of scope.
pub fn flatten_tree(store: &ObjectStore, tree_hash: &Hash) -> Result<FileMap> {
    let mut map = FileMap::new();
    let tree = store.read(tree_hash)?.as_tree()?.clone();
    flatten_into(store, &tree, "", &mut map)?;
    Ok(map)
}

fn flatten_into(store: &ObjectStore, tree: &Tree, prefix: &str, map: &mut FileMap) -> Result<()> {
    for entry in &tree.entries {
        let full = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", prefix, entry.name)
        };

        if entry.mode.is_gitlink() {
            continue;
        }

        if entry.mode.is_directory() {
            let subtree = store.read(&entry.hash)?.as_tree()?.clone();
            flatten_into(store, &subtree, &full, map)?;
        } else {
            let path = RepoPath::from_normalized(full)?;
            map.insert(
                path,
                FileState {
                    hash: entry.hash,
                    mode: entry.mode,
                },
            );
        }
    }
    Ok(())
}

/// Build the same shape of map directly from the staging index.
pub fn flatten_index(entries: &[IndexEntry]) -> Result<FileMap> {
    let mut map = FileMap::new();
    for entry in entries {
        let mode = FileMode::from_mode_bits(entry.mode)?;
        map.insert(entry.path.clone(), FileState { hash: entry.hash, mode });
    }
    Ok(map)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Modify,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub path: RepoPath,
    pub action: Action,
    pub hash: Hash,
    pub mode: FileMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub created: usize,
    pub modified: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

/// Diff two committed trees directly. If the two hashes are already equal
/// the trees are identical by construction — neither side needs flattening.
pub fn diff_trees(store: &ObjectStore, current_tree: &Hash, target_tree: &Hash) -> Result<(Vec<Operation>, DiffSummary)> {
    if current_tree == target_tree {
        return Ok((Vec::new(), DiffSummary::default()));
    }
    let current_map = flatten_tree(store, current_tree)?;
    let target_map = flatten_tree(store, target_tree)?;
    Ok(diff(&current_map, &target_map))
}

/// Diff `current` against `target`: every path in both maps is classified
/// as deleted, created, modified, or unchanged. Deletes are grouped first
/// so the file operator frees filesystem entries before creates of
/// similar names land.
pub fn diff(current: &FileMap, target: &FileMap) -> (Vec<Operation>, DiffSummary) {
    let mut deletes = Vec::new();
    let mut rest = Vec::new();
    let mut summary = DiffSummary::default();

    for (path, state) in current {
        if !target.contains_key(path) {
            deletes.push(Operation {
                path: path.clone(),
                action: Action::Delete,
                hash: state.hash,
                mode: state.mode,
            });
            summary.deleted += 1;
        }
    }

    for (path, state) in target {
        match current.get(path) {
            None => {
                rest.push(Operation {
                    path: path.clone(),
                    action: Action::Create,
                    hash: state.hash,
                    mode: state.mode,
                });
                summary.created += 1;
            }
            Some(current_state) if current_state != state => {
                rest.push(Operation {
                    path: path.clone(),
                    action: Action::Modify,
                    hash: state.hash,
                    mode: state.mode,
                });
                summary.modified += 1;
            }
            Some(_) => {
                summary.unchanged += 1;
            }
        }
    }

    deletes.extend(rest);
    (deletes, summary)
}
