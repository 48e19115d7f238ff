//! # Command Implementations
//!
//! Thin CLI-facing wrappers around the core modules. Each function here
//! takes already-parsed arguments, opens the repository, drives the core
//! API, and prints exactly what a user invoking the subcommand expects to
//! see — none of the actual logic lives here.
//!
//! ## Commands
//! - `init`: initialize a repository
//! - `add`: stage files
//! - `commit`: record staged changes
//! - `status`: show staged/unstaged/untracked state
//! - `log`: display commit history
//! - `branch`: manage branches
//! - `checkout`: switch branches or commits

pub mod add;
pub mod branch;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod log;
pub mod status;
