//! # Commit Command
//!
//! Record the staged index as a new commit and advance the current
//! branch (or HEAD, if detached).
//!
//! ## Usage
//!
//! ```bash
//! rit commit -m "Commit message"
//! ```

use anyhow::{Context, Result};

use crate::commit_mgr::CommitManager;
use crate::Repository;

pub fn run(message: &str) -> Result<()> {
    let repo = Repository::find()?;
    let store = repo.store();
    let refs = repo.refs();
    let index = repo.index()?;

    let manager = CommitManager::new(&store, &refs);
    let outcome = manager
        .create_commit(&index.entries(), message, &repo.config)
        .context("commit failed")?;

    let subject = message.lines().next().unwrap_or("");
    match &outcome.branch {
        Some(name) => println!("[{} {}] {}", name, outcome.hash.short(), subject),
        None => println!("[detached HEAD {}] {}", outcome.hash.short(), subject),
    }
    println!(" {} file(s) changed", index.count());

    Ok(())
}
