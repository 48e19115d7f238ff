//! All-or-nothing application of a batch of file operations: takes an
//! exclusive lock, applies operations in order while honoring a
//! cancellation token, and rolls back everything already applied if any
//! operation — or the cancellation itself — fails partway through.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, IoResultExt, Result};
use crate::file_ops::{Backup, FileOperator};
use crate::hash::Hash;
use crate::tree_analyzer::{Action, Operation};

/// Shared, cooperative stop signal threaded through long-running batches.
/// Checked between operations, never polled from a timer — callers flip it
/// explicitly (e.g. the CLI on Ctrl-C).
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct TransactionResult {
    pub success: bool,
    pub applied: usize,
    pub total: usize,
    pub error: Option<String>,
}

/// What a batch would do if applied, computed without touching disk or
/// acquiring the transaction lock.
#[derive(Debug, Default)]
pub struct DryRunReport {
    pub creates: usize,
    pub modifies: usize,
    pub deletes: usize,
    pub validation_error: Option<String>,
}

/// Reject a batch that fails §4.8's structural checks: no two operations
/// share a path, and every `Create`/`Modify` carries a real (non-zero)
/// hash. Checked once, up front, before any operation is applied.
fn validate(ops: &[Operation]) -> Result<()> {
    let mut seen = HashSet::new();
    for op in ops {
        if op.path.as_str().is_empty() {
            return Err(Error::invalid_argument("operation path must not be empty"));
        }
        if !seen.insert(op.path.clone()) {
            return Err(Error::invalid_argument(format!(
                "duplicate path in transaction batch: {}",
                op.path
            )));
        }
        if matches!(op.action, Action::Create | Action::Modify) && op.hash == Hash::ZERO {
            return Err(Error::invalid_argument(format!(
                "{:?} operation for {} carries no content hash",
                op.action, op.path
            )));
        }
    }
    Ok(())
}

/// Holds the exclusive lock file for the lifetime of one transaction,
/// created with `O_CREAT | O_EXCL` so a concurrent transaction fails fast
/// with [`Error::LockHeld`] instead of corrupting state.
struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    fn acquire(lock_path: PathBuf) -> Result<Self> {
        match OpenOptions::new().create_new(true).write(true).open(&lock_path) {
            Ok(_) => Ok(Self { path: lock_path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(Error::LockHeld { path: lock_path })
            }
            Err(e) => Err(e).with_path(&lock_path),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

pub struct TransactionManager<'a> {
    lock_path: PathBuf,
    operator: &'a FileOperator<'a>,
}

impl<'a> TransactionManager<'a> {
    pub fn new(meta_dir: &Path, operator: &'a FileOperator<'a>) -> Self {
        Self {
            lock_path: meta_dir.join("index.lock"),
            operator,
        }
    }

    /// Classify what a batch would do without acquiring the lock or
    /// touching the filesystem — distinct from [`FileOperator`]'s own
    /// `dry_run` flag, which still applies through the lock.
    pub fn dry_run(&self, ops: &[Operation]) -> DryRunReport {
        if let Err(e) = validate(ops) {
            return DryRunReport {
                validation_error: Some(e.to_string()),
                ..Default::default()
            };
        }

        let mut report = DryRunReport::default();
        for op in ops {
            match op.action {
                Action::Create => report.creates += 1,
                Action::Modify => report.modifies += 1,
                Action::Delete => report.deletes += 1,
            }
        }
        report
    }

    /// Apply every operation in order. On the first failure — an apply
    /// error or a cancellation request — every operation already applied
    /// is rolled back in reverse order before returning. On full success,
    /// backups are discarded since there is nothing left to roll back.
    pub fn apply_all(&self, ops: &[Operation], token: &CancellationToken) -> Result<TransactionResult> {
        validate(ops)?;
        let _lock = LockGuard::acquire(self.lock_path.clone())?;
        tracing::debug!(ops = ops.len(), "transaction lock acquired");

        let mut backups: Vec<Backup> = Vec::with_capacity(ops.len());
        let mut error = None;

        for op in ops {
            if token.is_cancelled() {
                error = Some("cancelled".to_string());
                break;
            }

            match self.operator.apply(op) {
                Ok(backup) => backups.push(backup),
                Err(e) => {
                    error = Some(e.to_string());
                    break;
                }
            }
        }

        let applied = backups.len();
        let success = error.is_none();

        if !success {
            tracing::warn!(applied, total = ops.len(), error = error.as_deref(), "rolling back transaction");
            for backup in backups.iter().rev() {
                if let Err(e) = self.operator.restore(backup) {
                    tracing::error!(%e, "rollback failed, repository may be inconsistent");
                    return Ok(TransactionResult {
                        success: false,
                        applied,
                        total: ops.len(),
                        error: Some(format!(
                            "{}; additionally, rollback failed: {}",
                            error.unwrap_or_default(),
                            e
                        )),
                    });
                }
            }
        } else {
            self.operator.cleanup(&backups);
            tracing::debug!(applied, "transaction committed");
        }

        Ok(TransactionResult {
            success,
            applied,
            total: ops.len(),
            error,
        })
    }
}
