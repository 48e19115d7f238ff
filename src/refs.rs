//! Reference storage: file-backed refs under `<meta>/refs/`, with `HEAD`
//! living directly at `<meta>/HEAD`. A ref is either a direct 40-hex hash
//! or a symbolic `ref: <target>\n` pointing at another ref by name.

use std::fs;
use std::path::PathBuf;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;

const SYMBOLIC_PREFIX: &str = "ref: ";
const MAX_RESOLUTION_DEPTH: usize = 5;

pub struct RefStore {
    meta_dir: PathBuf,
}

impl RefStore {
    pub fn new(meta_dir: impl Into<PathBuf>) -> Self {
        Self {
            meta_dir: meta_dir.into(),
        }
    }

    fn resolve_path(&self, ref_path: &str) -> PathBuf {
        self.meta_dir.join(ref_path)
    }

    /// Write a direct ref: `<40hex>\n`, atomically.
    pub fn update(&self, ref_path: &str, hash: &Hash) -> Result<()> {
        self.write_raw(ref_path, &format!("{}\n", hash.to_hex()))
    }

    /// Write a symbolic ref: `ref: <target>\n`, atomically.
    pub fn update_symbolic(&self, ref_path: &str, target: &str) -> Result<()> {
        self.write_raw(ref_path, &format!("{}{}\n", SYMBOLIC_PREFIX, target))
    }

    fn write_raw(&self, ref_path: &str, content: &str) -> Result<()> {
        let path = self.resolve_path(ref_path);
        let dir = path.parent().unwrap_or(&self.meta_dir);
        fs::create_dir_all(dir).with_path(dir)?;

        let tmp_path = dir.join(format!(".ref.tmp-{}", std::process::id()));
        fs::write(&tmp_path, content).with_path(&tmp_path)?;
        fs::rename(&tmp_path, &path).with_path(&path)?;
        tracing::debug!(ref_path, "updated ref");
        Ok(())
    }

    /// Return the raw, trimmed contents of a ref file (`"ref: <target>"`
    /// for a symbolic ref, the bare hex string for a direct one).
    pub fn read(&self, ref_path: &str) -> Result<String> {
        let path = self.resolve_path(ref_path);
        if !path.exists() {
            return Err(Error::not_found(format!("ref '{}'", ref_path)));
        }
        let content = fs::read_to_string(&path).with_path(&path)?;
        Ok(content.trim().to_string())
    }

    /// True if the ref's raw contents start with `"ref: "`.
    pub fn is_symbolic(&self, ref_path: &str) -> Result<bool> {
        Ok(self.read(ref_path)?.starts_with(SYMBOLIC_PREFIX))
    }

    /// Resolve a ref to a concrete hash, following symbolic chains up to
    /// [`MAX_RESOLUTION_DEPTH`] hops.
    pub fn resolve_to_hash(&self, ref_path: &str) -> Result<Hash> {
        self.resolve_to_hash_depth(ref_path, 0)
    }

    fn resolve_to_hash_depth(&self, ref_path: &str, depth: usize) -> Result<Hash> {
        if depth >= MAX_RESOLUTION_DEPTH {
            return Err(Error::corrupt(format!(
                "ref '{}' did not resolve within {} hops",
                ref_path, MAX_RESOLUTION_DEPTH
            )));
        }

        let content = self.read(ref_path)?;
        if let Some(target) = content.strip_prefix(SYMBOLIC_PREFIX) {
            self.resolve_to_hash_depth(target.trim(), depth + 1)
        } else {
            Hash::from_hex(&content)
        }
    }

    /// The final symbolic target a ref chain points at, without resolving
    /// it to a hash — used by the branch manager to tell "attached to
    /// branch X" apart from "detached at commit Y".
    pub fn symbolic_target(&self, ref_path: &str) -> Result<Option<String>> {
        let content = self.read(ref_path)?;
        Ok(content.strip_prefix(SYMBOLIC_PREFIX).map(|s| s.trim().to_string()))
    }

    pub fn delete(&self, ref_path: &str) -> Result<bool> {
        let path = self.resolve_path(ref_path);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).with_path(&path)?;
        tracing::debug!(ref_path, "deleted ref");
        Ok(true)
    }

    pub fn exists(&self, ref_path: &str) -> bool {
        self.resolve_path(ref_path).exists()
    }

    /// List every branch name under `refs/heads/`, sorted.
    pub fn list_branches(&self) -> Result<Vec<String>> {
        self.list_under("refs/heads")
    }

    fn list_under(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = self.resolve_path(prefix);
        let mut names = Vec::new();
        if dir.is_dir() {
            collect_names(&dir, &dir, &mut names)?;
        }
        names.sort();
        Ok(names)
    }
}

fn collect_names(base: &std::path::Path, dir: &std::path::Path, names: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir).with_path(dir)? {
        let entry = entry.with_path(dir)?;
        let path = entry.path();
        if path.is_dir() {
            collect_names(base, &path, names)?;
        } else if let Ok(rel) = path.strip_prefix(base) {
            names.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, RefStore) {
        let temp = tempdir().unwrap();
        let rs = RefStore::new(temp.path());
        (temp, rs)
    }

    #[test]
    fn direct_ref_roundtrips() {
        let (_temp, refs) = store();
        let hash = Hash::of(b"commit");
        refs.update("refs/heads/main", &hash).unwrap();
        assert_eq!(refs.resolve_to_hash("refs/heads/main").unwrap(), hash);
        assert!(!refs.is_symbolic("refs/heads/main").unwrap());
    }

    #[test]
    fn symbolic_head_resolves_through_branch() {
        let (_temp, refs) = store();
        let hash = Hash::of(b"commit");
        refs.update("refs/heads/main", &hash).unwrap();
        refs.update_symbolic("HEAD", "refs/heads/main").unwrap();

        assert!(refs.is_symbolic("HEAD").unwrap());
        assert_eq!(refs.resolve_to_hash("HEAD").unwrap(), hash);
        assert_eq!(
            refs.symbolic_target("HEAD").unwrap(),
            Some("refs/heads/main".to_string())
        );
    }

    #[test]
    fn missing_ref_is_not_found() {
        let (_temp, refs) = store();
        assert!(refs.read("refs/heads/missing").is_err());
        assert!(refs.resolve_to_hash("refs/heads/missing").is_err());
    }

    #[test]
    fn cycle_is_rejected() {
        let (_temp, refs) = store();
        refs.update_symbolic("refs/heads/a", "refs/heads/b").unwrap();
        refs.update_symbolic("refs/heads/b", "refs/heads/a").unwrap();
        assert!(refs.resolve_to_hash("refs/heads/a").is_err());
    }

    #[test]
    fn delete_is_idempotent() {
        let (_temp, refs) = store();
        let hash = Hash::of(b"x");
        refs.update("refs/heads/topic", &hash).unwrap();
        assert!(refs.delete("refs/heads/topic").unwrap());
        assert!(!refs.delete("refs/heads/topic").unwrap());
    }

    #[test]
    fn list_branches_sorted() {
        let (_temp, refs) = store();
        let hash = Hash::ZERO;
        refs.update("refs/heads/main", &hash).unwrap();
        refs.update("refs/heads/topic/nested", &hash).unwrap();
        refs.update("refs/heads/alpha", &hash).unwrap();

        let branches = refs.list_branches().unwrap();
        assert_eq!(branches, vec!["alpha", "main", "topic/nested"]);
    }
}
