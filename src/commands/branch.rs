//! # Branch Command
//!
//! Create, list, rename, or delete branches.
//!
//! ## Usage
//!
//! ```bash
//! rit branch                  # list, current marked with *
//! rit branch feature-branch   # create at HEAD
//! rit branch -d old-branch    # delete (blocks unmerged/current)
//! rit branch -D old-branch    # force delete
//! rit branch -m old new       # rename
//! ```

use anyhow::{Context, Result};

use crate::branch::{self, HeadState};
use crate::Repository;

pub fn list(repo: &Repository) -> Result<()> {
    let refs = repo.refs();
    let current = match branch::head_state(&refs)? {
        HeadState::Attached(name) | HeadState::Unborn(name) => Some(name),
        HeadState::Detached(_) => None,
    };

    for name in branch::list_branches(&refs)? {
        if Some(&name) == current.as_ref() {
            println!("* {}", name);
        } else {
            println!("  {}", name);
        }
    }
    Ok(())
}

pub fn create(repo: &Repository, name: &str, start_point: Option<&str>) -> Result<()> {
    let refs = repo.refs();
    let hash = match start_point {
        Some(target) => refs.resolve_to_hash(&branch::branch_ref(target)).or_else(|_| target.parse())?,
        None => branch::current_commit(&refs)?
            .context("cannot create a branch: HEAD does not point to a commit yet")?,
    };
    branch::create_branch(&refs, name, hash)?;
    Ok(())
}

pub fn delete(repo: &Repository, name: &str, force: bool) -> Result<()> {
    let refs = repo.refs();
    let hash = branch::delete_branch(&refs, name, force)?;
    println!("Deleted branch {} (was {}).", name, hash.short());
    Ok(())
}

pub fn rename(repo: &Repository, old: &str, new: &str, force: bool) -> Result<()> {
    let refs = repo.refs();
    branch::rename_branch(&refs, old, new, force)?;
    Ok(())
}
