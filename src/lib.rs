//! A Git-compatible local version-control engine: a content-addressed
//! object database, a binary staging index, a transactional
//! working-directory synchronizer, and a reference/branch layer, fronted by
//! a thin `clap`-derived CLI.
//!
//! ## Repository layout
//!
//! ```text
//! .rit/
//! ├── HEAD            # "ref: refs/heads/<branch>" or a direct 40-hex hash
//! ├── config           # [core] defaultBranch / bare, INI-like
//! ├── index            # binary DIRC v2 staging index
//! ├── objects/         # fan-out loose-object store
//! │   └── <xx>/<rest>
//! ├── refs/
//! │   ├── heads/       # branches
//! │   └── tags/
//! └── tmp/              # transaction backups, pruned on commit/rollback
//! ```
//!
//! [`Repository`] locates and opens this layout; the core subsystems
//! ([`store`], [`index`], [`refs`], [`branch`], [`commit_mgr`], [`status`])
//! operate on paths and handles it hands out, and never consult a process-
//! wide global.

pub mod branch;
pub mod commands;
pub mod commit_mgr;
pub mod config;
pub mod error;
pub mod file_ops;
pub mod hash;
pub mod ignore;
pub mod index;
pub mod index_updater;
pub mod objects;
pub mod path;
pub mod pool;
pub mod refs;
pub mod status;
pub mod store;
pub mod transaction;
pub mod tree_analyzer;
pub mod validator;

use std::path::{Path, PathBuf};

use error::{Error, IoResultExt, Result};
use index::IndexManager;
use refs::RefStore;
use store::ObjectStore;

/// The name of the metadata directory (analogous to `.git`).
pub const RIT_DIR: &str = ".rit";

/// An opened repository: the working-tree root plus the metadata directory
/// beneath it. Cheap to construct repeatedly — it borrows nothing and owns
/// only paths and the parsed `config` file.
#[derive(Debug)]
pub struct Repository {
    pub root: PathBuf,
    pub meta_dir: PathBuf,
    pub config: config::Config,
}

impl Repository {
    /// Walk up from the current directory looking for a metadata directory.
    pub fn find() -> Result<Self> {
        let current_dir = std::env::current_dir().with_path(".")?;
        Self::find_from(&current_dir)
    }

    /// Walk up from `start` looking for a metadata directory, per §9's
    /// "repository locator function, not global state".
    pub fn find_from(start: &Path) -> Result<Self> {
        let mut current = start.to_path_buf();
        loop {
            let meta_dir = current.join(RIT_DIR);
            if meta_dir.is_dir() {
                let config = config::Config::load(&meta_dir.join("config"))?;
                return Ok(Self {
                    root: current,
                    meta_dir,
                    config,
                });
            }
            if !current.pop() {
                return Err(Error::not_found(
                    "a rit repository (or any parent directory containing one)",
                ));
            }
        }
    }

    /// Initialize a new repository at `path`. Reinitializing an existing
    /// one is a no-op beyond refreshing `config` in memory — matches Git's
    /// "Reinitialized existing repository" behavior.
    pub fn init(path: &Path, default_branch: Option<&str>, bare: bool) -> Result<Self> {
        let root = path.to_path_buf();
        let meta_dir = root.join(RIT_DIR);

        let reinit = meta_dir.is_dir();
        if !reinit {
            std::fs::create_dir_all(&meta_dir).with_path(&meta_dir)?;
            std::fs::create_dir_all(meta_dir.join("objects")).with_path(&meta_dir)?;
            std::fs::create_dir_all(meta_dir.join("refs/heads")).with_path(&meta_dir)?;
            std::fs::create_dir_all(meta_dir.join("refs/tags")).with_path(&meta_dir)?;
        }

        let mut config = config::Config::load(&meta_dir.join("config"))?;
        if let Some(name) = default_branch {
            config.set("core.defaultBranch", name);
        }
        if bare {
            config.set("core.bare", "true");
        }
        config.write(&meta_dir.join("config"))?;

        if !reinit {
            let refs = RefStore::new(&meta_dir);
            refs.update_symbolic("HEAD", &branch::branch_ref(config.default_branch()))?;
        }

        Ok(Self {
            root,
            meta_dir,
            config,
        })
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.meta_dir.join("objects")
    }

    pub fn refs_dir(&self) -> PathBuf {
        self.meta_dir.join("refs")
    }

    pub fn head_path(&self) -> PathBuf {
        self.meta_dir.join("HEAD")
    }

    pub fn index_path(&self) -> PathBuf {
        self.meta_dir.join("index")
    }

    pub fn config_path(&self) -> PathBuf {
        self.meta_dir.join("config")
    }

    pub fn store(&self) -> ObjectStore {
        ObjectStore::new(self.objects_dir())
    }

    pub fn refs(&self) -> RefStore {
        RefStore::new(&self.meta_dir)
    }

    pub fn index(&self) -> Result<IndexManager> {
        IndexManager::open(self.index_path())
    }

    /// Default width for the bounded worker pool used by tree walking,
    /// diffing, and validation (§5) — hardware parallelism, falling back to
    /// single-threaded if it can't be determined.
    pub fn worker_count(&self) -> usize {
        pool::default_width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_creates_expected_structure() {
        let temp = tempdir().unwrap();
        let repo = Repository::init(temp.path(), None, false).unwrap();

        assert!(repo.meta_dir.exists());
        assert!(repo.objects_dir().exists());
        assert!(repo.refs_dir().join("heads").exists());
        assert!(repo.head_path().exists());

        let head = std::fs::read_to_string(repo.head_path()).unwrap();
        assert_eq!(head, "ref: refs/heads/master\n");
    }

    #[test]
    fn init_honors_custom_default_branch() {
        let temp = tempdir().unwrap();
        let repo = Repository::init(temp.path(), Some("trunk"), false).unwrap();
        let head = std::fs::read_to_string(repo.head_path()).unwrap();
        assert_eq!(head, "ref: refs/heads/trunk\n");
        assert_eq!(repo.config.default_branch(), "trunk");
    }

    #[test]
    fn reinit_does_not_move_head() {
        let temp = tempdir().unwrap();
        Repository::init(temp.path(), None, false).unwrap();
        let refs = RefStore::new(temp.path().join(RIT_DIR));
        refs.update(&branch::branch_ref("master"), &hash::Hash::of(b"x")).unwrap();

        Repository::init(temp.path(), None, false).unwrap();
        let head = std::fs::read_to_string(temp.path().join(RIT_DIR).join("HEAD")).unwrap();
        assert_eq!(head, "ref: refs/heads/master\n");
        assert!(refs.exists(&branch::branch_ref("master")));
    }

    #[test]
    fn find_from_walks_up_parent_directories() {
        let temp = tempdir().unwrap();
        Repository::init(temp.path(), None, false).unwrap();
        let nested = temp.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let found = Repository::find_from(&nested).unwrap();
        assert_eq!(found.root, temp.path());
    }

    #[test]
    fn find_fails_outside_any_repository() {
        let temp = tempdir().unwrap();
        assert!(Repository::find_from(temp.path()).is_err());
    }
}
