//! # Status Command
//!
//! Show staged changes, unstaged changes, and untracked files.
//!
//! ## Usage
//!
//! ```bash
//! rit status
//! rit status -s   # short format
//! ```

use anyhow::Result;

use crate::branch::{self, HeadState};
use crate::status::{self, UnstagedChange};
use crate::tree_analyzer::Action;
use crate::Repository;

pub fn run(short: bool) -> Result<()> {
    let repo = Repository::find()?;
    let store = repo.store();
    let refs = repo.refs();
    let index = repo.index()?;
    let entries = index.entries();

    let report = status::compute(&repo.root, &repo.meta_dir, &store, &refs, &entries, repo.worker_count())?;

    if short {
        print_short(&report);
        return Ok(());
    }

    match branch::head_state(&refs)? {
        HeadState::Attached(name) => println!("On branch {}", name),
        HeadState::Unborn(name) => println!("On branch {}\n\nNo commits yet", name),
        HeadState::Detached(hash) => println!("HEAD detached at {}", hash.short()),
    }

    if !report.staged.is_empty() {
        println!("\nChanges to be committed:");
        for op in &report.staged {
            let verb = match op.action {
                Action::Create => "new file:  ",
                Action::Modify => "modified:  ",
                Action::Delete => "deleted:   ",
            };
            println!("\t{}{}", verb, op.path);
        }
    }

    if !report.unstaged.is_empty() {
        println!("\nChanges not staged for commit:");
        for change in &report.unstaged {
            match change {
                UnstagedChange::Modified(path) => println!("\tmodified:   {}", path),
                UnstagedChange::Deleted(path) => println!("\tdeleted:    {}", path),
            }
        }
    }

    if !report.untracked.is_empty() {
        println!("\nUntracked files:");
        for path in &report.untracked {
            println!("\t{}", path);
        }
    }

    if report.is_clean() {
        println!("\nnothing to commit, working tree clean");
    }

    Ok(())
}

fn print_short(report: &status::StatusReport) {
    use std::collections::BTreeMap;

    let mut lines: BTreeMap<String, (char, char)> = BTreeMap::new();
    for op in &report.staged {
        let code = match op.action {
            Action::Create => 'A',
            Action::Modify => 'M',
            Action::Delete => 'D',
        };
        lines.entry(op.path.as_str().to_string()).or_insert((' ', ' ')).0 = code;
    }
    for change in &report.unstaged {
        let (path, code) = match change {
            UnstagedChange::Modified(p) => (p.as_str().to_string(), 'M'),
            UnstagedChange::Deleted(p) => (p.as_str().to_string(), 'D'),
        };
        lines.entry(path).or_insert((' ', ' ')).1 = code;
    }
    for path in &report.untracked {
        lines.entry(path.as_str().to_string()).or_insert(('?', '?'));
    }

    for (path, (x, y)) in lines {
        println!("{}{} {}", x, y, path);
    }
}
