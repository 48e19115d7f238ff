//! Applies a single file-level change to the working directory: atomic
//! write-temp-then-rename-fsync for create/modify, unlink-and-prune for
//! delete. Every apply can be reversed from the backup it hands back,
//! which is what the transaction manager rolls back through on failure.

use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::error::{IoResultExt, Result};
use crate::objects::FileMode;
use crate::store::ObjectStore;
use crate::tree_analyzer::{Action, Operation};

/// Snapshot of what a path looked like before an operation was applied,
/// sufficient to restore it exactly.
#[derive(Debug, Clone)]
pub struct Backup {
    pub path: PathBuf,
    /// Where the pre-operation content was copied to, if the path existed.
    pub saved_content: Option<PathBuf>,
    pub existed: bool,
    pub mode: Option<u32>,
}

pub struct FileOperator<'a> {
    repo_root: &'a Path,
    backup_dir: PathBuf,
    store: &'a ObjectStore,
    dry_run: bool,
}

impl<'a> FileOperator<'a> {
    pub fn new(repo_root: &'a Path, backup_dir: PathBuf, store: &'a ObjectStore, dry_run: bool) -> Self {
        Self {
            repo_root,
            backup_dir,
            store,
            dry_run,
        }
    }

    /// Apply one operation, returning a backup the caller can later pass to
    /// [`FileOperator::restore`] to undo it.
    pub fn apply(&self, op: &Operation) -> Result<Backup> {
        let fs_path = op.path.to_fs_path(self.repo_root);
        let backup = self.snapshot(&fs_path)?;

        if self.dry_run {
            return Ok(backup);
        }

        match op.action {
            Action::Delete => self.apply_delete(&fs_path)?,
            Action::Create | Action::Modify => self.apply_write(&fs_path, op.hash, op.mode)?,
        }

        Ok(backup)
    }

    fn snapshot(&self, fs_path: &Path) -> Result<Backup> {
        let existed = fs_path.symlink_metadata().is_ok();
        if !existed {
            return Ok(Backup {
                path: fs_path.to_path_buf(),
                saved_content: None,
                existed: false,
                mode: None,
            });
        }

        let metadata = fs::symlink_metadata(fs_path).with_path(fs_path)?;
        let mode = file_mode_bits(&metadata);

        fs::create_dir_all(&self.backup_dir).with_path(&self.backup_dir)?;
        let saved = self.backup_dir.join(format!("{:x}", backup_id(fs_path)));
        if metadata.file_type().is_symlink() {
            let target = fs::read_link(fs_path).with_path(fs_path)?;
            fs::write(&saved, target.to_string_lossy().as_bytes()).with_path(&saved)?;
        } else if metadata.is_file() {
            fs::copy(fs_path, &saved).with_path(&saved)?;
        }

        Ok(Backup {
            path: fs_path.to_path_buf(),
            saved_content: Some(saved),
            existed: true,
            mode,
        })
    }

    fn apply_delete(&self, fs_path: &Path) -> Result<()> {
        if fs_path.symlink_metadata().is_ok() {
            fs::remove_file(fs_path).with_path(fs_path)?;
        }
        self.prune_empty_parents(fs_path);
        Ok(())
    }

    fn apply_write(&self, fs_path: &Path, hash: crate::hash::Hash, mode: FileMode) -> Result<()> {
        if let Some(parent) = fs_path.parent() {
            fs::create_dir_all(parent).with_path(parent)?;
        }

        let object = self.store.read(&hash)?;
        let content = object.as_blob()?.content.clone();

        if mode == FileMode::Symlink {
            if fs_path.symlink_metadata().is_ok() {
                fs::remove_file(fs_path).with_path(fs_path)?;
            }
            let target = String::from_utf8_lossy(&content).into_owned();
            std::os::unix::fs::symlink(target, fs_path).with_path(fs_path)?;
            return Ok(());
        }

        let tmp_path = fs_path.with_extension(format!("tmp-{}", std::process::id()));
        {
            let mut file = fs::File::create(&tmp_path).with_path(&tmp_path)?;
            use std::io::Write;
            file.write_all(&content).with_path(&tmp_path)?;
            file.sync_all().with_path(&tmp_path)?;
        }
        if mode == FileMode::Executable {
            set_executable(&tmp_path)?;
        }
        fs::rename(&tmp_path, fs_path).with_path(fs_path)?;
        Ok(())
    }

    /// Remove now-empty directories upward from `fs_path`, stopping at the
    /// repository root (never crossing it).
    fn prune_empty_parents(&self, fs_path: &Path) {
        let mut dir = match fs_path.parent() {
            Some(d) => d.to_path_buf(),
            None => return,
        };

        while dir != self.repo_root && dir.starts_with(self.repo_root) {
            match fs::read_dir(&dir) {
                Ok(mut entries) if entries.next().is_none() => {
                    if fs::remove_dir(&dir).is_err() {
                        break;
                    }
                }
                _ => break,
            }
            match dir.parent() {
                Some(p) => dir = p.to_path_buf(),
                None => break,
            }
        }
    }

    /// Discard the saved pre-image for a set of backups once a transaction
    /// has committed successfully and they'll never be rolled back through.
    pub fn cleanup(&self, backups: &[Backup]) {
        for backup in backups {
            if let Some(saved) = &backup.saved_content {
                let _ = fs::remove_file(saved);
            }
        }
    }

    /// Undo an applied operation using its backup.
    pub fn restore(&self, backup: &Backup) -> Result<()> {
        if !backup.existed {
            if backup.path.symlink_metadata().is_ok() {
                fs::remove_file(&backup.path).with_path(&backup.path)?;
                self.prune_empty_parents(&backup.path);
            }
            return Ok(());
        }

        if let Some(parent) = backup.path.parent() {
            fs::create_dir_all(parent).with_path(parent)?;
        }

        let saved = backup.saved_content.as_ref().expect("existed backups carry content");
        fs::copy(saved, &backup.path).with_path(&backup.path)?;
        if let Some(mode) = backup.mode {
            restore_mode_bits(&backup.path, mode)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn file_mode_bits(metadata: &fs::Metadata) -> Option<u32> {
    metadata.is_file().then(|| metadata.permissions().mode())
}

#[cfg(not(unix))]
fn file_mode_bits(_metadata: &fs::Metadata) -> Option<u32> {
    None
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    let mut perms = fs::metadata(path).with_path(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).with_path(path)
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn restore_mode_bits(path: &Path, mode: u32) -> Result<()> {
    let mut perms = fs::metadata(path).with_path(path)?.permissions();
    perms.set_mode(mode);
    fs::set_permissions(path, perms).with_path(path)
}

#[cfg(not(unix))]
fn restore_mode_bits(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

fn backup_id(path: &Path) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    hasher.finish()
}
