//! Branch lifecycle and the HEAD state machine (§4.10): attached (HEAD is
//! symbolic to an existing `refs/heads/<name>`), detached (HEAD holds a
//! commit hash directly), or unborn (HEAD is symbolic to a branch whose
//! ref doesn't exist yet — the state right after `init`, before the first
//! commit). Also the checkout engine: diff current vs. target tree, apply
//! through the transaction manager, rewrite the index, move HEAD.

use std::path::Path;

use crate::error::{Error, Result};
use crate::file_ops::FileOperator;
use crate::hash::Hash;
use crate::index::IndexManager;
use crate::index_updater;
use crate::refs::RefStore;
use crate::store::ObjectStore;
use crate::transaction::{CancellationToken, TransactionManager};
use crate::tree_analyzer::{self, FileMap};
use crate::validator;

const HEAD: &str = "HEAD";
const HEADS_PREFIX: &str = "refs/heads/";

pub fn branch_ref(name: &str) -> String {
    format!("{}{}", HEADS_PREFIX, name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    /// HEAD is symbolic to an existing branch.
    Attached(String),
    /// HEAD holds a commit hash directly.
    Detached(Hash),
    /// HEAD is symbolic to a branch whose ref file doesn't exist yet.
    Unborn(String),
}

pub fn head_state(refs: &RefStore) -> Result<HeadState> {
    match refs.symbolic_target(HEAD)? {
        Some(target) => {
            let name = target.strip_prefix(HEADS_PREFIX).unwrap_or(&target).to_string();
            if refs.exists(&target) {
                Ok(HeadState::Attached(name))
            } else {
                Ok(HeadState::Unborn(name))
            }
        }
        None => Ok(HeadState::Detached(refs.resolve_to_hash(HEAD)?)),
    }
}

/// The commit HEAD currently points at, or `None` if HEAD is attached to a
/// branch that has no commits yet.
pub fn current_commit(refs: &RefStore) -> Result<Option<Hash>> {
    match head_state(refs)? {
        HeadState::Attached(name) => Ok(Some(refs.resolve_to_hash(&branch_ref(&name))?)),
        HeadState::Detached(hash) => Ok(Some(hash)),
        HeadState::Unborn(_) => Ok(None),
    }
}

/// Reject branch names that would collide with ref-file syntax or with
/// Git's own reserved forms: empty, a leading dash (could be mistaken for
/// a flag), whitespace or ASCII control characters, a `..` component, a
/// `.lock` suffix, a reflog-style `@{` sequence, or the literal `HEAD`.
pub fn validate_branch_name(name: &str) -> Result<()> {
    let reject = |reason: &str| Err(Error::invalid_argument(format!("invalid branch name '{}': {}", name, reason)));

    if name.is_empty() {
        return reject("must not be empty");
    }
    if name == "HEAD" {
        return reject("'HEAD' is reserved");
    }
    if name.starts_with('-') {
        return reject("must not start with '-'");
    }
    if name.contains(' ') || name.chars().any(|c| c.is_ascii_control()) {
        return reject("must not contain whitespace or control characters");
    }
    if name.contains("..") {
        return reject("must not contain '..'");
    }
    if name.ends_with(".lock") {
        return reject("must not end with '.lock'");
    }
    if name.contains("@{") {
        return reject("must not contain '@{'");
    }
    Ok(())
}

pub fn create_branch(refs: &RefStore, name: &str, start_point: Hash) -> Result<()> {
    validate_branch_name(name)?;
    let ref_path = branch_ref(name);
    if refs.exists(&ref_path) {
        return Err(Error::conflict(format!("branch '{}' already exists", name)));
    }
    refs.update(&ref_path, &start_point)
}

/// Delete a branch, returning the commit hash it pointed at.
///
/// "Merged" is checked as "points at the same commit HEAD currently does"
/// rather than a full ancestor-reachability walk — a deliberate
/// simplification (no commit-graph index is maintained beyond first-parent
/// links, and the common case this guards against is deleting a branch
/// with no other path back to it).
pub fn delete_branch(refs: &RefStore, name: &str, force: bool) -> Result<Hash> {
    let ref_path = branch_ref(name);
    let hash = refs.resolve_to_hash(&ref_path)?;

    if let HeadState::Attached(current) = head_state(refs)? {
        if current == name && !force {
            return Err(Error::conflict(format!("cannot delete branch '{}' checked out", name)));
        }
    }

    if !force {
        if let Some(head_hash) = current_commit(refs)? {
            if head_hash != hash {
                return Err(Error::conflict(format!(
                    "branch '{}' is not fully merged; use force to delete anyway",
                    name
                )));
            }
        }
    }

    refs.delete(&ref_path)?;
    Ok(hash)
}

pub fn rename_branch(refs: &RefStore, old: &str, new: &str, force: bool) -> Result<()> {
    validate_branch_name(new)?;
    let old_ref = branch_ref(old);
    let new_ref = branch_ref(new);

    let hash = refs.resolve_to_hash(&old_ref)?;
    if refs.exists(&new_ref) && !force {
        return Err(Error::conflict(format!("branch '{}' already exists", new)));
    }

    refs.update(&new_ref, &hash)?;
    refs.delete(&old_ref)?;

    if let HeadState::Attached(current) = head_state(refs)? {
        if current == old {
            refs.update_symbolic(HEAD, &new_ref)?;
        }
    }
    Ok(())
}

pub fn list_branches(refs: &RefStore) -> Result<Vec<String>> {
    refs.list_branches()
}

/// Point HEAD symbolically at an as-yet-nonexistent branch — the next
/// commit gives it its first commit, same as any other unborn branch.
///
/// This only rewrites `HEAD`; it does not clear the index or the working
/// tree. Full `--orphan` semantics (§4.10), including that clearing, live
/// in [`CheckoutContext::checkout_orphan`], which calls this after
/// successfully clearing.
fn set_unborn_head(refs: &RefStore, name: &str) -> Result<()> {
    validate_branch_name(name)?;
    let ref_path = branch_ref(name);
    if refs.exists(&ref_path) {
        return Err(Error::conflict(format!("branch '{}' already exists", name)));
    }
    refs.update_symbolic(HEAD, &ref_path)
}

/// Where a checkout's target comes from, once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutTarget {
    Branch(String),
    Commit(Hash),
}

/// Resolve `"HEAD"`, an existing branch name, or a full 40-character
/// commit hash to a concrete checkout target. Short-hash expansion is out
/// of scope — this core keeps no abbreviation index.
pub fn resolve_checkout_target(refs: &RefStore, target: &str) -> Result<CheckoutTarget> {
    if target == HEAD {
        return current_commit(refs)?
            .map(CheckoutTarget::Commit)
            .ok_or_else(|| Error::invalid_argument("HEAD does not point to a commit yet"));
    }

    let branch_path = branch_ref(target);
    if refs.exists(&branch_path) {
        return Ok(CheckoutTarget::Branch(target.to_string()));
    }

    if target.len() == Hash::LEN * 2 {
        return Ok(CheckoutTarget::Commit(Hash::from_hex(target)?));
    }

    Err(Error::not_found(format!("reference '{}'", target)))
}

/// Everything the checkout engine needs, borrowed from the repository.
pub struct CheckoutContext<'a> {
    pub repo_root: &'a Path,
    pub meta_dir: &'a Path,
    pub store: &'a ObjectStore,
    pub refs: &'a RefStore,
    pub index: &'a IndexManager,
    pub worker_count: usize,
}

impl<'a> CheckoutContext<'a> {
    /// Materialize `target_commit` (or an empty tree, for an orphan
    /// checkout's target) into the working directory and index. Refuses to
    /// proceed if the working tree has unstaged changes the caller didn't
    /// force through.
    fn apply(&self, target_commit: Option<Hash>, force: bool, token: &CancellationToken) -> Result<FileMap> {
        let current_entries = self.index.entries();
        let current_map = tree_analyzer::flatten_index(&current_entries)?;

        // If the target commit's tree is the same tree the currently
        // checked-out commit carries, the trees are identical with no walk —
        // reuse the already-flattened index instead of re-reading the target
        // tree object by object.
        let current_tree = current_commit(self.refs)?
            .map(|hash| self.store.read(&hash).and_then(|o| Ok(o.as_commit()?.tree)))
            .transpose()?;

        let target_map = match target_commit {
            Some(hash) => {
                let commit = self.store.read(&hash)?.as_commit()?.clone();
                if current_tree == Some(commit.tree) {
                    current_map.clone()
                } else {
                    tree_analyzer::flatten_tree(self.store, &commit.tree)?
                }
            }
            None => FileMap::new(),
        };

        if !force {
            let dirty = validator::classify_many(&current_entries, self.repo_root, self.worker_count)
                .into_iter()
                .any(|m| m.is_dirty());
            if dirty {
                return Err(Error::conflict(
                    "local changes would be overwritten by checkout; use force to discard them",
                ));
            }
        }

        let (ops, _summary) = tree_analyzer::diff(&current_map, &target_map);

        let operator = FileOperator::new(self.repo_root, self.meta_dir.join("checkout-backups"), self.store, false);
        let manager = TransactionManager::new(self.meta_dir, &operator);
        let result = manager.apply_all(&ops, token)?;
        if !result.success {
            return Err(Error::conflict(result.error.unwrap_or_else(|| "checkout failed".to_string())));
        }

        let new_entries = index_updater::rebuild_from_file_map(&target_map, self.repo_root)?;
        self.index.replace_all(new_entries)?;

        Ok(target_map)
    }

    /// Switch to an existing branch, moving HEAD to point at it.
    pub fn checkout_branch(&self, name: &str, force: bool, token: &CancellationToken) -> Result<()> {
        let ref_path = branch_ref(name);
        let hash = self.refs.resolve_to_hash(&ref_path)?;
        self.apply(Some(hash), force, token)?;
        self.refs.update_symbolic(HEAD, &ref_path)
    }

    /// Detach HEAD at a specific commit.
    pub fn checkout_detached(&self, hash: Hash, force: bool, token: &CancellationToken) -> Result<()> {
        self.apply(Some(hash), force, token)?;
        self.refs.update(HEAD, &hash)
    }

    /// Create a new branch at `start_point` and immediately check it out.
    pub fn checkout_new_branch(&self, name: &str, start_point: Hash, force: bool, token: &CancellationToken) -> Result<()> {
        create_branch(self.refs, name, start_point)?;
        self.checkout_branch(name, force, token)
    }

    /// Start a new, parentless branch history (§4.10's `--orphan`): clear
    /// the index and every currently tracked working-tree file — same
    /// dirty-tree guard as any other checkout unless `force` is set — then
    /// point HEAD symbolically at `name`. The branch ref itself is created
    /// lazily, by the first commit.
    pub fn checkout_orphan(&self, name: &str, force: bool, token: &CancellationToken) -> Result<()> {
        validate_branch_name(name)?;
        let ref_path = branch_ref(name);
        if self.refs.exists(&ref_path) {
            return Err(Error::conflict(format!("branch '{}' already exists", name)));
        }
        self.apply(None, force, token)?;
        set_unborn_head(self.refs, name)
    }
}
