//! # Log Command
//!
//! Display commit history by walking the first-parent chain from HEAD.
//!
//! ## Usage
//!
//! ```bash
//! rit log
//! rit log -n 5
//! rit log --oneline
//! ```

use anyhow::Result;

use crate::commit_mgr::CommitManager;
use crate::objects::Commit;
use crate::Repository;

fn format_commit(hash: &crate::hash::Hash, commit: &Commit, oneline: bool) -> String {
    if oneline {
        let subject = commit.message.lines().next().unwrap_or("");
        return format!("{} {}", hash.short(), subject);
    }

    let mut lines = vec![format!("commit {}", hash)];
    if commit.is_merge() {
        let parents: Vec<String> = commit.parents.iter().map(|p| p.short()).collect();
        lines.push(format!("Merge: {}", parents.join(" ")));
    }
    lines.push(format!("Author: {} <{}>", commit.author.name, commit.author.email));
    lines.push(format!("Date:   {} {}", commit.author.timestamp, commit.author.timezone));
    lines.push(String::new());
    for line in commit.message.lines() {
        lines.push(format!("    {}", line));
    }
    lines.join("\n")
}

pub fn run(limit: Option<usize>, oneline: bool) -> Result<()> {
    let repo = Repository::find()?;
    let store = repo.store();
    let refs = repo.refs();
    let manager = CommitManager::new(&store, &refs);

    let history = manager.history(None, limit.unwrap_or(usize::MAX))?;
    if history.is_empty() {
        println!("fatal: your current branch does not have any commits yet");
        return Ok(());
    }

    for (i, (hash, commit)) in history.iter().enumerate() {
        println!("{}", format_commit(hash, commit, oneline));
        if !oneline && i + 1 < history.len() {
            println!();
        }
    }
    Ok(())
}
