//! # Init Command
//!
//! Initialize a new repository.
//!
//! ## What it does
//!
//! Creates the metadata directory structure:
//!
//! ```text
//! .rit/
//! ├── HEAD           # "ref: refs/heads/<default branch>\n"
//! ├── config         # core.defaultBranch, core.bare
//! ├── objects/       # object database (empty)
//! └── refs/
//!     ├── heads/     # branch references
//!     └── tags/      # tag references
//! ```
//!
//! ## Usage
//!
//! ```bash
//! rit init
//! rit init /path/to/repo
//! rit init --initial-branch trunk
//! ```

use std::path::Path;

use anyhow::Result;

use crate::Repository;

pub fn run(path: Option<&Path>, initial_branch: Option<&str>, bare: bool) -> Result<()> {
    let target = path.unwrap_or(Path::new("."));
    std::fs::create_dir_all(target)?;
    let repo = Repository::init(target, initial_branch, bare)?;

    println!(
        "Initialized empty rit repository in {}",
        repo.meta_dir.display()
    );
    Ok(())
}
