//! The staging index manager: the in-memory index plus the absolute path
//! of its on-disk file, serializing concurrent operations behind a
//! process-scoped readers-writer lock.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::index::codec::{self, IndexEntry};
use crate::objects::{FileMode, Object};
use crate::path::RepoPath;
use crate::store::ObjectStore;

/// Per-path result of an `add` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Modified,
    Ignored,
    Failed(String),
}

pub struct IndexManager {
    path: PathBuf,
    entries: RwLock<Vec<IndexEntry>>,
}

impl IndexManager {
    /// Read the index file if present, otherwise start empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let data = fs::read(&path).with_path(&path)?;
            codec::decode(&data)?
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Stage each path: stat it, read its bytes, write a blob, insert or
    /// replace its entry, persisting atomically once all paths are
    /// processed. Input paths must already be regular files or symlinks —
    /// directory expansion is the caller's responsibility.
    pub fn add(&self, paths: &[(RepoPath, PathBuf)], store: &ObjectStore) -> Result<Vec<(RepoPath, AddOutcome)>> {
        let mut guard = self.entries.write().expect("index lock poisoned");
        let mut results = Vec::with_capacity(paths.len());

        for (repo_path, fs_path) in paths {
            match self.stage_one(repo_path, fs_path, store, &guard) {
                Ok(outcome) => {
                    if let Some(entry) = self.build_entry(repo_path, fs_path, store)? {
                        replace_entry(&mut guard, entry);
                    }
                    results.push((repo_path.clone(), outcome));
                }
                Err(e) => results.push((repo_path.clone(), AddOutcome::Failed(e.to_string()))),
            }
        }

        codec::sort_entries(&mut guard);
        self.persist(&guard)?;
        Ok(results)
    }

    fn stage_one(
        &self,
        repo_path: &RepoPath,
        fs_path: &Path,
        _store: &ObjectStore,
        guard: &[IndexEntry],
    ) -> Result<AddOutcome> {
        let metadata = fs::symlink_metadata(fs_path).with_path(fs_path)?;
        if metadata.is_dir() {
            return Err(Error::invalid_argument(format!(
                "'{}' is a directory, expand it before adding",
                repo_path
            )));
        }

        let existing = guard.iter().find(|e| &e.path == repo_path);
        Ok(if existing.is_some() {
            AddOutcome::Modified
        } else {
            AddOutcome::Added
        })
    }

    fn build_entry(&self, repo_path: &RepoPath, fs_path: &Path, store: &ObjectStore) -> Result<Option<IndexEntry>> {
        let metadata = fs::symlink_metadata(fs_path).with_path(fs_path)?;
        let mode = FileMode::from_metadata(&metadata);

        let content = if metadata.file_type().is_symlink() {
            let target = fs::read_link(fs_path).with_path(fs_path)?;
            target.to_string_lossy().into_owned().into_bytes()
        } else {
            fs::read(fs_path).with_path(fs_path)?
        };

        let blob = Object::Blob(crate::objects::Blob::new(content));
        let hash = store.write(&blob)?;

        Ok(Some(stat_entry(repo_path.clone(), fs_path, &metadata, mode, hash)?))
    }

    /// Drop matching entries, optionally unlinking the working-tree file.
    pub fn remove(&self, paths: &[RepoPath], delete_from_disk: bool, repo_root: &Path) -> Result<()> {
        let mut guard = self.entries.write().expect("index lock poisoned");
        guard.retain(|e| !paths.contains(&e.path));
        self.persist(&guard)?;

        if delete_from_disk {
            for path in paths {
                let fs_path = path.to_fs_path(repo_root);
                if fs_path.exists() {
                    fs::remove_file(&fs_path).with_path(&fs_path)?;
                }
            }
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let mut guard = self.entries.write().expect("index lock poisoned");
        guard.clear();
        self.persist(&guard)
    }

    pub fn get(&self, path: &RepoPath) -> Option<IndexEntry> {
        let guard = self.entries.read().expect("index lock poisoned");
        guard.iter().find(|e| &e.path == path).cloned()
    }

    pub fn has(&self, path: &RepoPath) -> bool {
        self.get(path).is_some()
    }

    pub fn paths(&self) -> Vec<RepoPath> {
        let guard = self.entries.read().expect("index lock poisoned");
        guard.iter().map(|e| e.path.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.entries.read().expect("index lock poisoned").len()
    }

    /// A consistent snapshot of every entry, for the tree analyzer and
    /// status engine to build their path maps from.
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.entries.read().expect("index lock poisoned").clone()
    }

    /// Overwrite the index wholesale with a caller-provided entry set
    /// (used by the index updater after a checkout).
    pub fn replace_all(&self, entries: Vec<IndexEntry>) -> Result<()> {
        let mut guard = self.entries.write().expect("index lock poisoned");
        *guard = entries;
        codec::sort_entries(&mut guard);
        self.persist(&guard)
    }

    fn persist(&self, entries: &[IndexEntry]) -> Result<()> {
        let encoded = codec::encode(entries);
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).with_path(dir)?;

        let tmp_path = dir.join(format!(".index.tmp-{}", std::process::id()));
        fs::write(&tmp_path, &encoded).with_path(&tmp_path)?;
        fs::rename(&tmp_path, &self.path).with_path(&self.path)?;
        tracing::debug!(path = %self.path.display(), entries = entries.len(), "persisted index");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn replace_entry(entries: &mut Vec<IndexEntry>, entry: IndexEntry) {
    if let Some(existing) = entries.iter_mut().find(|e| e.path == entry.path) {
        *existing = entry;
    } else {
        entries.push(entry);
    }
}

fn stat_entry(
    path: RepoPath,
    fs_path: &Path,
    metadata: &fs::Metadata,
    mode: FileMode,
    hash: Hash,
) -> Result<IndexEntry> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        Ok(IndexEntry {
            ctime_secs: metadata.ctime() as u32,
            ctime_nsecs: metadata.ctime_nsec() as u32,
            mtime_secs: metadata.mtime() as u32,
            mtime_nsecs: metadata.mtime_nsec() as u32,
            dev: metadata.dev() as u32,
            ino: metadata.ino() as u32,
            mode: mode.to_mode_bits(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.len() as u32,
            hash,
            assume_valid: false,
            stage: 0,
            path,
        })
    }
    #[cfg(not(unix))]
    {
        let _ = fs_path;
        Ok(IndexEntry {
            ctime_secs: 0,
            ctime_nsecs: 0,
            mtime_secs: 0,
            mtime_nsecs: 0,
            dev: 0,
            ino: 0,
            mode: mode.to_mode_bits(),
            uid: 0,
            gid: 0,
            size: metadata.len() as u32,
            hash,
            assume_valid: false,
            stage: 0,
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, ObjectStore, IndexManager) {
        let temp = tempdir().unwrap();
        let store = ObjectStore::new(temp.path().join("objects"));
        let manager = IndexManager::open(temp.path().join("index")).unwrap();
        (temp, store, manager)
    }

    #[test]
    fn opening_missing_index_starts_empty() {
        let (_temp, _store, manager) = setup();
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn add_then_reopen_preserves_entries() {
        let (temp, store, manager) = setup();
        let file_path = temp.path().join("a.txt");
        fs::write(&file_path, b"hello").unwrap();

        let repo_path = RepoPath::from_relative(Path::new("a.txt")).unwrap();
        let results = manager.add(&[(repo_path.clone(), file_path)], &store).unwrap();
        assert_eq!(results[0].1, AddOutcome::Added);
        assert!(manager.has(&repo_path));

        let reopened = IndexManager::open(temp.path().join("index")).unwrap();
        assert!(reopened.has(&repo_path));
        assert_eq!(reopened.count(), 1);
    }

    #[test]
    fn re_adding_same_path_reports_modified() {
        let (temp, store, manager) = setup();
        let file_path = temp.path().join("a.txt");
        fs::write(&file_path, b"v1").unwrap();
        let repo_path = RepoPath::from_relative(Path::new("a.txt")).unwrap();

        manager.add(&[(repo_path.clone(), file_path.clone())], &store).unwrap();
        fs::write(&file_path, b"v2").unwrap();
        let results = manager.add(&[(repo_path, file_path)], &store).unwrap();
        assert_eq!(results[0].1, AddOutcome::Modified);
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn adding_a_directory_fails() {
        let (temp, store, manager) = setup();
        let dir_path = temp.path().join("subdir");
        fs::create_dir(&dir_path).unwrap();
        let repo_path = RepoPath::from_relative(Path::new("subdir")).unwrap();

        let results = manager.add(&[(repo_path, dir_path)], &store).unwrap();
        matches!(&results[0].1, AddOutcome::Failed(_));
    }

    #[test]
    fn remove_drops_entry_and_can_delete_file() {
        let (temp, store, manager) = setup();
        let file_path = temp.path().join("a.txt");
        fs::write(&file_path, b"hello").unwrap();
        let repo_path = RepoPath::from_relative(Path::new("a.txt")).unwrap();
        manager.add(&[(repo_path.clone(), file_path.clone())], &store).unwrap();

        manager.remove(&[repo_path.clone()], true, temp.path()).unwrap();
        assert!(!manager.has(&repo_path));
        assert!(!file_path.exists());
    }

    #[test]
    fn clear_empties_and_persists() {
        let (temp, store, manager) = setup();
        let file_path = temp.path().join("a.txt");
        fs::write(&file_path, b"hello").unwrap();
        let repo_path = RepoPath::from_relative(Path::new("a.txt")).unwrap();
        manager.add(&[(repo_path, file_path)], &store).unwrap();

        manager.clear().unwrap();
        assert_eq!(manager.count(), 0);

        let reopened = IndexManager::open(temp.path().join("index")).unwrap();
        assert_eq!(reopened.count(), 0);
    }
}
