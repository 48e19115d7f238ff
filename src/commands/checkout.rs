//! # Checkout Command
//!
//! Switch the working directory, index, and HEAD to a branch or a commit.
//!
//! ## Usage
//!
//! ```bash
//! rit checkout main
//! rit checkout -b feature
//! rit checkout --detach a1b2c3d...
//! rit checkout --orphan fresh-start
//! rit checkout -f main   # discard local changes
//! ```

use anyhow::{Context, Result};

use crate::branch::{self, CheckoutContext, CheckoutTarget};
use crate::transaction::CancellationToken;
use crate::Repository;

pub struct CheckoutArgs<'a> {
    pub target: &'a str,
    pub new_branch: bool,
    pub detach: bool,
    pub orphan: bool,
    pub force: bool,
}

pub fn run(args: CheckoutArgs) -> Result<()> {
    let repo = Repository::find()?;
    let store = repo.store();
    let refs = repo.refs();
    let index = repo.index()?;
    let token = CancellationToken::new();

    let ctx = CheckoutContext {
        repo_root: &repo.root,
        meta_dir: &repo.meta_dir,
        store: &store,
        refs: &refs,
        index: &index,
        worker_count: repo.worker_count(),
    };

    if args.orphan {
        ctx.checkout_orphan(args.target, args.force, &token)?;
        println!("Switched to a new branch '{}'", args.target);
        return Ok(());
    }

    if args.new_branch {
        let start = branch::current_commit(&refs)?.context("HEAD does not point to a commit yet")?;
        ctx.checkout_new_branch(args.target, start, args.force, &token)?;
        println!("Switched to a new branch '{}'", args.target);
        return Ok(());
    }

    if args.detach {
        let hash = args.target.parse()?;
        ctx.checkout_detached(hash, args.force, &token)?;
        println!("HEAD is now at {}", hash.short());
        return Ok(());
    }

    match branch::resolve_checkout_target(&refs, args.target)? {
        CheckoutTarget::Branch(name) => {
            ctx.checkout_branch(&name, args.force, &token)?;
            println!("Switched to branch '{}'", name);
        }
        CheckoutTarget::Commit(hash) => {
            ctx.checkout_detached(hash, args.force, &token)?;
            println!("Note: checking out '{}'.", args.target);
            println!("HEAD is now at {}", hash.short());
        }
    }

    Ok(())
}
