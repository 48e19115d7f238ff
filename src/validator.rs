//! Compares the working directory against the staging index without
//! touching either: used before a non-forced checkout to refuse clobbering
//! local changes, and by the status engine's unstaged-diff pass.

use std::fs;
use std::path::{Path, PathBuf};

use crate::index::IndexEntry;
use crate::pool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modification {
    Deleted,
    SizeChanged,
    ContentChanged,
    /// mtime moved but size and content both match — not a real change.
    TimeChanged,
    Clean,
}

impl Modification {
    /// Whether the working tree actually differs from what's staged.
    /// `TimeChanged` alone never counts as dirty — only size or content
    /// divergence does.
    pub fn is_dirty(&self) -> bool {
        matches!(self, Modification::Deleted | Modification::SizeChanged | Modification::ContentChanged)
    }
}

/// Classify one entry's state on disk relative to what the index recorded.
///
/// Size is checked first since it never requires reading the file. Once
/// size matches, the file is always hashed to settle whether its content
/// actually changed — an mtime match alone is not trusted, since a forged
/// or reproduced mtime on rewritten content must still surface as
/// `ContentChanged`. `TimeChanged` means the mtime moved but the hash
/// didn't: the entry was touched (e.g. checked out again) without its
/// bytes changing.
pub fn classify(entry: &IndexEntry, repo_root: &Path) -> Modification {
    if entry.assume_valid {
        return Modification::Clean;
    }

    let fs_path = entry.path.to_fs_path(repo_root);

    let metadata = match fs::symlink_metadata(&fs_path) {
        Ok(m) => m,
        Err(_) => return Modification::Deleted,
    };

    let size_matches = metadata.len() == entry.size as u64;
    if !size_matches {
        return Modification::SizeChanged;
    }

    let mtime_matches = mtime_secs(&metadata) == entry.mtime_secs;
    let content_matches = matches!(hash_matches(&fs_path, &entry.hash), Ok(true));

    match (mtime_matches, content_matches) {
        (true, true) => Modification::Clean,
        (true, false) => Modification::ContentChanged,
        (false, true) => Modification::TimeChanged,
        (false, false) => Modification::ContentChanged,
    }
}

/// Classify every entry's state against the working directory, spread
/// across a bounded worker pool. Order matches `entries`.
pub fn classify_many(entries: &[IndexEntry], repo_root: &Path, worker_count: usize) -> Vec<Modification> {
    let work: Vec<(IndexEntry, PathBuf)> = entries
        .iter()
        .map(|e| (e.clone(), repo_root.to_path_buf()))
        .collect();
    pool::map_parallel(work, worker_count, |(entry, root)| classify(&entry, &root))
}

#[cfg(unix)]
fn mtime_secs(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mtime() as u32
}

#[cfg(not(unix))]
fn mtime_secs(_metadata: &fs::Metadata) -> u32 {
    0
}

fn hash_matches(fs_path: &Path, expected: &crate::hash::Hash) -> crate::error::Result<bool> {
    use crate::objects::Blob;
    let blob = Blob::from_file(fs_path)?;
    Ok(&blob.hash() == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Blob, FileMode};
    use crate::path::RepoPath;
    use tempfile::tempdir;

    fn entry_for(root: &Path, name: &str, content: &[u8]) -> IndexEntry {
        let fs_path = root.join(name);
        fs::write(&fs_path, content).unwrap();
        let metadata = fs::symlink_metadata(&fs_path).unwrap();
        #[cfg(unix)]
        use std::os::unix::fs::MetadataExt;
        IndexEntry {
            ctime_secs: 0,
            ctime_nsecs: 0,
            #[cfg(unix)]
            mtime_secs: metadata.mtime() as u32,
            #[cfg(not(unix))]
            mtime_secs: 0,
            mtime_nsecs: 0,
            dev: 0,
            ino: 0,
            mode: FileMode::Regular.to_mode_bits(),
            uid: 0,
            gid: 0,
            size: metadata.len() as u32,
            hash: Blob::new(content.to_vec()).hash(),
            assume_valid: false,
            stage: 0,
            path: RepoPath::from_relative(Path::new(name)).unwrap(),
        }
    }

    #[test]
    fn clean_file_classifies_clean() {
        let temp = tempdir().unwrap();
        let entry = entry_for(temp.path(), "a.txt", b"hello");
        assert_eq!(classify(&entry, temp.path()), Modification::Clean);
    }

    #[test]
    fn deleted_file_classifies_deleted() {
        let temp = tempdir().unwrap();
        let entry = entry_for(temp.path(), "a.txt", b"hello");
        fs::remove_file(temp.path().join("a.txt")).unwrap();
        let result = classify(&entry, temp.path());
        assert_eq!(result, Modification::Deleted);
        assert!(result.is_dirty());
    }

    #[test]
    fn size_changed_is_dirty() {
        let temp = tempdir().unwrap();
        let mut entry = entry_for(temp.path(), "a.txt", b"hello");
        entry.size += 1;
        let result = classify(&entry, temp.path());
        assert_eq!(result, Modification::SizeChanged);
        assert!(result.is_dirty());
    }

    #[test]
    fn touched_but_identical_content_is_not_dirty() {
        let temp = tempdir().unwrap();
        let mut entry = entry_for(temp.path(), "a.txt", b"hello");
        // same size, different recorded mtime, identical bytes on disk
        entry.mtime_secs = entry.mtime_secs.wrapping_add(1000);
        let result = classify(&entry, temp.path());
        assert_eq!(result, Modification::TimeChanged);
        assert!(!result.is_dirty());
    }

    #[test]
    fn content_changed_with_same_size_is_dirty() {
        let temp = tempdir().unwrap();
        let entry = entry_for(temp.path(), "a.txt", b"abcde");
        fs::write(temp.path().join("a.txt"), b"edcba").unwrap();
        let result = classify(&entry, temp.path());
        assert_eq!(result, Modification::ContentChanged);
        assert!(result.is_dirty());
    }

    #[test]
    fn forged_mtime_with_same_size_but_different_content_is_dirty() {
        let temp = tempdir().unwrap();
        let entry = entry_for(temp.path(), "a.txt", b"abcde");
        let recorded_mtime = entry.mtime_secs;
        // Rewrite with same-length but different content, then force the
        // mtime back to what the index recorded — an mtime match must not
        // be trusted on its own.
        fs::write(temp.path().join("a.txt"), b"edcba").unwrap();
        set_mtime_secs(&temp.path().join("a.txt"), recorded_mtime);

        let result = classify(&entry, temp.path());
        assert_eq!(result, Modification::ContentChanged);
        assert!(result.is_dirty());
    }

    #[cfg(unix)]
    fn set_mtime_secs(path: &Path, secs: u32) {
        use std::time::{Duration, UNIX_EPOCH};
        let mtime = UNIX_EPOCH + Duration::from_secs(secs as u64);
        let atime = fs::symlink_metadata(path).unwrap().accessed().unwrap_or(mtime);
        let times = fs::FileTimes::new().set_accessed(atime).set_modified(mtime);
        fs::OpenOptions::new().write(true).open(path).unwrap().set_times(times).unwrap();
    }

    #[cfg(not(unix))]
    fn set_mtime_secs(_path: &Path, _secs: u32) {}

    #[test]
    fn assume_valid_short_circuits_to_clean() {
        let temp = tempdir().unwrap();
        let mut entry = entry_for(temp.path(), "a.txt", b"hello");
        entry.assume_valid = true;
        fs::write(temp.path().join("a.txt"), b"changed-but-ignored").unwrap();
        assert_eq!(classify(&entry, temp.path()), Modification::Clean);
    }

    #[test]
    fn classify_many_matches_sequential_classify() {
        let temp = tempdir().unwrap();
        let a = entry_for(temp.path(), "a.txt", b"hello");
        let b = entry_for(temp.path(), "b.txt", b"world");
        let entries = vec![a.clone(), b.clone()];

        let results = classify_many(&entries, temp.path(), 4);
        assert_eq!(results, vec![classify(&a, temp.path()), classify(&b, temp.path())]);
    }
}
