//! Typed repository-relative paths.
//!
//! Every path that ends up in the index or a tree object passes through
//! [`RepoPath`] first: forward slashes only, no `.`/`..` components, no
//! empty components, valid UTF-8.

use std::fmt;
use std::path::{Component, Path};

use crate::error::{Error, Result};

/// A normalized, validated path relative to the repository root.
///
/// Stored internally with `/` separators regardless of platform, which
/// matches the wire format used by trees and the index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepoPath(String);

impl RepoPath {
    /// Normalize and validate a path relative to `root`.
    ///
    /// Accepts either an absolute path under `root` or an already-relative
    /// path. Rejects paths that escape `root` or contain `.`/`..` segments.
    pub fn from_rooted(root: &Path, candidate: &Path) -> Result<Self> {
        let relative = if candidate.is_absolute() {
            candidate
                .strip_prefix(root)
                .map_err(|_| Error::InvalidArgument {
                    message: format!(
                        "path '{}' is not inside repository root '{}'",
                        candidate.display(),
                        root.display()
                    ),
                })?
        } else {
            candidate
        };
        Self::from_relative(relative)
    }

    /// Normalize and validate a path already known to be relative.
    pub fn from_relative(relative: &Path) -> Result<Self> {
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| Error::InvalidArgument {
                        message: format!("path '{}' is not valid UTF-8", relative.display()),
                    })?;
                    if part.is_empty() {
                        continue;
                    }
                    parts.push(part.to_string());
                }
                Component::CurDir => continue,
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::InvalidArgument {
                        message: format!(
                            "path '{}' contains a disallowed component",
                            relative.display()
                        ),
                    });
                }
            }
        }
        if parts.is_empty() {
            return Err(Error::InvalidArgument {
                message: "path is empty".to_string(),
            });
        }
        if parts.len() > 1 && parts.iter().any(|p| p.len() > 4095) {
            return Err(Error::InvalidArgument {
                message: format!("path '{}' exceeds maximum component length", relative.display()),
            });
        }
        Ok(Self(parts.join("/")))
    }

    /// Build directly from an already-normalized `/`-separated string,
    /// re-validating it (used when reading paths back from disk formats).
    pub fn from_normalized(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.is_empty() || s.len() > 4095 {
            return Err(Error::Corrupt {
                message: format!("invalid path length: {}", s.len()),
            });
        }
        if s.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
            return Err(Error::Corrupt {
                message: format!("path '{}' contains a disallowed component", s),
            });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path component (file or directory name).
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The parent directory, as a `/`-joined string, empty if at the root.
    pub fn parent(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// Join onto an absolute filesystem root.
    pub fn to_fs_path(&self, root: &Path) -> std::path::PathBuf {
        root.join(&self.0)
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RepoPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
