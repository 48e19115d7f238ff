//! Builds a tree object from the staging index and wraps it in a commit,
//! then advances whatever HEAD currently points at. Also walks the
//! first-parent chain for `log`.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::branch::{self, HeadState};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::index::IndexEntry;
use crate::objects::{Commit, FileMode, Object, Person, Tree, TreeEntry};
use crate::refs::RefStore;
use crate::store::ObjectStore;

pub struct CommitManager<'a> {
    pub store: &'a ObjectStore,
    pub refs: &'a RefStore,
}

#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub hash: Hash,
    pub parent: Option<Hash>,
    pub branch: Option<String>,
}

impl<'a> CommitManager<'a> {
    pub fn new(store: &'a ObjectStore, refs: &'a RefStore) -> Self {
        Self { store, refs }
    }

    /// Build a tree from `entries`, wrap it in a commit with `message`, and
    /// advance HEAD (or the branch it's attached to). Refuses an empty
    /// message or an empty index — an empty tree can only be produced by
    /// `checkout --orphan`, never by `commit`.
    pub fn create_commit(&self, entries: &[IndexEntry], message: &str, config: &Config) -> Result<CommitOutcome> {
        if message.trim().is_empty() {
            return Err(Error::invalid_argument("commit message must not be empty"));
        }
        if entries.is_empty() {
            return Err(Error::invalid_argument("nothing to commit, the index is empty"));
        }

        let tree_hash = self.write_tree(entries)?;
        let parent = branch::current_commit(self.refs)?;

        if let Some(parent_hash) = parent {
            let parent_commit = self.store.read(&parent_hash)?.as_commit()?.clone();
            if parent_commit.tree == tree_hash {
                return Err(Error::invalid_argument("nothing to commit, working tree matches HEAD"));
            }
        }

        let author = resolve_author(config);
        let committer = resolve_committer(config, &author);
        let commit = Commit::new(
            tree_hash,
            parent.into_iter().collect(),
            author,
            committer,
            message.trim_end().to_string(),
        );
        let hash = self.store.write(&Object::Commit(commit))?;

        let branch_name = match branch::head_state(self.refs)? {
            HeadState::Attached(name) | HeadState::Unborn(name) => {
                self.refs.update(&branch::branch_ref(&name), &hash)?;
                Some(name)
            }
            HeadState::Detached(_) => {
                self.refs.update("HEAD", &hash)?;
                None
            }
        };

        tracing::info!(%hash, branch = branch_name.as_deref(), parent = ?parent.map(|h| h.short()), "created commit");

        Ok(CommitOutcome {
            hash,
            parent,
            branch: branch_name,
        })
    }

    /// Build a tree object (and every subtree it needs) from a flat,
    /// lexicographically-sorted list of index entries.
    ///
    /// Entries are sorted by full path string, so every entry sharing a
    /// top-level directory prefix is contiguous in the slice — a single
    /// pass groups children by their first path component without a
    /// separate path-to-children map.
    fn write_tree(&self, entries: &[IndexEntry]) -> Result<Hash> {
        let mut sorted: Vec<&IndexEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| a.path.as_str().cmp(b.path.as_str()));
        self.write_tree_level(&sorted, 0)
    }

    /// Build the tree for the directory holding every entry in `entries`,
    /// where `depth` path components have already been consumed.
    fn write_tree_level(&self, entries: &[&IndexEntry], depth: usize) -> Result<Hash> {
        let mut tree = Tree::new();
        let mut i = 0;
        while i < entries.len() {
            let components: Vec<&str> = entries[i].path.as_str().split('/').collect();
            let name = components[depth];

            if depth + 1 == components.len() {
                let mode = FileMode::from_mode_bits(entries[i].mode)?;
                tree.add_entry(TreeEntry::new(mode, name, entries[i].hash));
                i += 1;
                continue;
            }

            let mut j = i + 1;
            while j < entries.len() {
                let other: Vec<&str> = entries[j].path.as_str().split('/').collect();
                if other.len() <= depth || other[depth] != name {
                    break;
                }
                j += 1;
            }

            let subtree_hash = self.write_tree_level(&entries[i..j], depth + 1)?;
            tree.add_entry(TreeEntry::new(FileMode::Directory, name, subtree_hash));
            i = j;
        }

        tree.sort();
        self.store.write(&Object::Tree(tree))
    }

    /// Walk the first-parent chain starting at `start` (or HEAD's current
    /// commit), returning at most `limit` commits, newest first.
    pub fn history(&self, start: Option<Hash>, limit: usize) -> Result<Vec<(Hash, Commit)>> {
        let mut current = match start {
            Some(hash) => Some(hash),
            None => branch::current_commit(self.refs)?,
        };

        let mut history = Vec::new();
        while let Some(hash) = current {
            if history.len() >= limit {
                break;
            }
            let commit = self.store.read(&hash)?.as_commit()?.clone();
            let next = commit.parents.first().copied();
            history.push((hash, commit));
            current = next;
        }
        Ok(history)
    }
}

/// Resolve the author identity: `RIT_AUTHOR_NAME`/`RIT_AUTHOR_EMAIL`, falling
/// back to `GIT_AUTHOR_NAME`/`GIT_AUTHOR_EMAIL` for drop-in use inside
/// scripts that already export them, falling back to `user.name`/
/// `user.email` in the repo config, falling back to a fixed placeholder so
/// a commit is never blocked on identity configuration.
fn resolve_author(config: &Config) -> Person {
    let name = std::env::var("RIT_AUTHOR_NAME")
        .or_else(|_| std::env::var("GIT_AUTHOR_NAME"))
        .ok()
        .or_else(|| config.get("user.name").map(str::to_string))
        .unwrap_or_else(|| "Unknown".to_string());

    let email = std::env::var("RIT_AUTHOR_EMAIL")
        .or_else(|_| std::env::var("GIT_AUTHOR_EMAIL"))
        .ok()
        .or_else(|| config.get("user.email").map(str::to_string))
        .unwrap_or_else(|| "unknown@localhost".to_string());

    Person::new(name, email, now_secs(), "+0000")
}

/// Resolve the committer identity independently of the author:
/// `RIT_COMMITTER_NAME`/`RIT_COMMITTER_EMAIL`, falling back to
/// `GIT_COMMITTER_NAME`/`GIT_COMMITTER_EMAIL`, falling back to the already
/// resolved author identity when neither is set — the same default a commit
/// made without any committer env vars has always had.
fn resolve_committer(config: &Config, author: &Person) -> Person {
    let name = std::env::var("RIT_COMMITTER_NAME")
        .or_else(|_| std::env::var("GIT_COMMITTER_NAME"))
        .ok()
        .unwrap_or_else(|| author.name.clone());

    let email = std::env::var("RIT_COMMITTER_EMAIL")
        .or_else(|_| std::env::var("GIT_COMMITTER_EMAIL"))
        .ok()
        .unwrap_or_else(|| author.email.clone());

    let _ = config;
    Person::new(name, email, now_secs(), "+0000")
}

// Timezone offsets aren't tracked anywhere in this repository; every
// timestamp is recorded as UTC.
fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}
