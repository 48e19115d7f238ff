//! Keeps the staging index consistent with the working directory after a
//! transaction commits: a checkout rewrites the index wholesale to match
//! the tree it just materialized, re-statting every written file so mtimes
//! and sizes reflect what's actually on disk.

use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, Result};
use crate::index::IndexEntry;
use crate::tree_analyzer::FileMap;

/// Build a fresh set of index entries for every path in `target`, statting
/// each one on disk. Used after a checkout applies its operations, when
/// the working tree now matches `target` exactly.
pub fn rebuild_from_file_map(target: &FileMap, repo_root: &Path) -> Result<Vec<IndexEntry>> {
    let mut entries = Vec::with_capacity(target.len());
    for (path, state) in target {
        let fs_path = path.to_fs_path(repo_root);
        let metadata = fs::symlink_metadata(&fs_path).with_path(&fs_path)?;
        entries.push(stat_entry(path.clone(), &metadata, state.mode.to_mode_bits(), state.hash));
    }
    entries.sort_by(|a, b| a.path.as_str().cmp(b.path.as_str()));
    Ok(entries)
}

/// Re-stat a single existing index entry against whatever is now on disk —
/// used after `add` has already written the blob and the caller just needs
/// a fresh stat snapshot, or after a partial checkout touches one path.
pub fn refresh_entry(entry: &IndexEntry, repo_root: &Path) -> Result<IndexEntry> {
    let fs_path = entry.path.to_fs_path(repo_root);
    let metadata = fs::symlink_metadata(&fs_path).with_path(&fs_path)?;
    Ok(stat_entry(entry.path.clone(), &metadata, entry.mode, entry.hash))
}

#[cfg(unix)]
fn stat_entry(path: crate::path::RepoPath, metadata: &fs::Metadata, mode: u32, hash: crate::hash::Hash) -> IndexEntry {
    use std::os::unix::fs::MetadataExt;
    IndexEntry {
        ctime_secs: metadata.ctime() as u32,
        ctime_nsecs: metadata.ctime_nsec() as u32,
        mtime_secs: metadata.mtime() as u32,
        mtime_nsecs: metadata.mtime_nsec() as u32,
        dev: metadata.dev() as u32,
        ino: metadata.ino() as u32,
        mode,
        uid: metadata.uid(),
        gid: metadata.gid(),
        size: metadata.len() as u32,
        hash,
        assume_valid: false,
        stage: 0,
        path,
    }
}

#[cfg(not(unix))]
fn stat_entry(path: crate::path::RepoPath, metadata: &fs::Metadata, mode: u32, hash: crate::hash::Hash) -> IndexEntry {
    IndexEntry {
        ctime_secs: 0,
        ctime_nsecs: 0,
        mtime_secs: 0,
        mtime_nsecs: 0,
        dev: 0,
        ino: 0,
        mode,
        uid: 0,
        gid: 0,
        size: metadata.len() as u32,
        hash,
        assume_valid: false,
        stage: 0,
        path,
    }
}
