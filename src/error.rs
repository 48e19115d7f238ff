//! Error taxonomy shared by every core module.
//!
//! Kinds, not type names: each variant corresponds to a row of the
//! taxonomy, and carries whatever context makes the rendered message
//! actionable (a path, a hash, the underlying I/O error).

use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("corrupt: {message}")]
    Corrupt { message: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("lock held: {path}")]
    LockHeld { path: PathBuf },

    #[error("io error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("rollback failed after '{operation}': {message}")]
    RollbackFailed { operation: String, message: String },
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound { what: what.into() }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Error::Corrupt {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Error::Conflict {
            message: message.into(),
        }
    }

    /// True for errors that indicate the working tree or index may now be
    /// inconsistent with what the caller expects — used by the CLI shell to
    /// pick exit code 2 instead of 1.
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::RollbackFailed { .. } | Error::Corrupt { .. })
    }
}

/// Extension trait for wrapping bare `std::io::Result` values with the path
/// they concerned, so every I/O failure names the file or directory it
/// touched rather than surfacing a bare `io::Error`.
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
