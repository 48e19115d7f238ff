//! A tree represents a directory: an ordered, sorted list of
//! `{mode, name, hash}` entries. Entries serialize as
//! `"<octal mode> <name>\0<20 raw hash bytes>"` concatenated in sort order.

use crate::error::Error;
use crate::hash::Hash;

/// File type and permission bits, encoded the way Git writes them on disk
/// (octal, no leading zero for directories — `40000`, not `040000`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Regular,
    Executable,
    Symlink,
    Directory,
    Gitlink,
}

impl FileMode {
    pub fn as_octal_str(&self) -> &'static str {
        match self {
            FileMode::Regular => "100644",
            FileMode::Executable => "100755",
            FileMode::Symlink => "120000",
            FileMode::Directory => "40000",
            FileMode::Gitlink => "160000",
        }
    }

    pub fn parse(s: &str) -> crate::error::Result<Self> {
        match s {
            "100644" => Ok(FileMode::Regular),
            "100755" => Ok(FileMode::Executable),
            "120000" => Ok(FileMode::Symlink),
            "40000" | "040000" => Ok(FileMode::Directory),
            "160000" => Ok(FileMode::Gitlink),
            other => Err(Error::corrupt(format!("unrecognized tree entry mode '{}'", other))),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, FileMode::Directory)
    }

    pub fn is_gitlink(&self) -> bool {
        matches!(self, FileMode::Gitlink)
    }

    /// The canonical numeric mode stored in an index entry's stat-mode
    /// field — one of the five values below, never raw permission bits.
    pub fn to_mode_bits(&self) -> u32 {
        match self {
            FileMode::Regular => 0o100644,
            FileMode::Executable => 0o100755,
            FileMode::Symlink => 0o120000,
            FileMode::Directory => 0o040000,
            FileMode::Gitlink => 0o160000,
        }
    }

    pub fn from_mode_bits(mode: u32) -> crate::error::Result<Self> {
        match mode {
            0o100644 => Ok(FileMode::Regular),
            0o100755 => Ok(FileMode::Executable),
            0o120000 => Ok(FileMode::Symlink),
            0o040000 => Ok(FileMode::Directory),
            0o160000 => Ok(FileMode::Gitlink),
            other => Err(Error::corrupt(format!("unrecognized stat mode {:o}", other))),
        }
    }

    /// Classify a file on disk into the normalized mode git would record,
    /// based on its type and (for regular files) its executable bit.
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        if metadata.file_type().is_symlink() {
            FileMode::Symlink
        } else if metadata.is_dir() {
            FileMode::Directory
        } else {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if metadata.permissions().mode() & 0o111 != 0 {
                    return FileMode::Executable;
                }
            }
            FileMode::Regular
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub name: String,
    pub hash: Hash,
}

impl TreeEntry {
    pub fn new(mode: FileMode, name: impl Into<String>, hash: Hash) -> Self {
        Self {
            mode,
            name: name.into(),
            hash,
        }
    }

    /// Entries sort by name, with a trailing `/` appended for directories,
    /// so that e.g. `dir/` sorts before `dirty`.
    fn sort_key(&self) -> String {
        if self.mode.is_directory() {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    fn serialize_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.mode.as_octal_str().as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(self.name.as_bytes());
        buf.push(0);
        buf.extend_from_slice(self.hash.as_bytes());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, entry: TreeEntry) {
        self.entries.push(entry);
    }

    /// Canonical directory-aware sort, matching the index's sort order.
    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for entry in &self.entries {
            entry.serialize_into(&mut buf);
        }
        buf
    }

    pub fn parse(content: &[u8]) -> crate::error::Result<Self> {
        let mut entries = Vec::new();
        let mut pos = 0;

        while pos < content.len() {
            let space_pos = content[pos..]
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| Error::corrupt("tree entry missing mode separator"))?;
            let mode_str = std::str::from_utf8(&content[pos..pos + space_pos])
                .map_err(|_| Error::corrupt("tree entry mode is not valid UTF-8"))?;
            let mode = FileMode::parse(mode_str)?;
            pos += space_pos + 1;

            let null_pos = content[pos..]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| Error::corrupt("tree entry missing name terminator"))?;
            let name = std::str::from_utf8(&content[pos..pos + null_pos])
                .map_err(|_| Error::corrupt("tree entry name is not valid UTF-8"))?
                .to_string();
            pos += null_pos + 1;

            if pos + Hash::LEN > content.len() {
                return Err(Error::corrupt("tree entry truncated before hash"));
            }
            let hash = Hash::from_slice(&content[pos..pos + Hash::LEN])?;
            pos += Hash::LEN;

            entries.push(TreeEntry { mode, name, hash });
        }

        let names_unique = {
            let mut seen = std::collections::HashSet::new();
            entries.iter().all(|e| seen.insert(&e.name))
        };
        if !names_unique {
            return Err(Error::corrupt("tree contains duplicate entry names"));
        }

        Ok(Self { entries })
    }
}
