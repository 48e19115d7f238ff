//! A blob stores opaque file content — no filename, no permissions, just
//! bytes. `blob <size>\0<content>` once framed by the object store.

use crate::error::{IoResultExt, Result};
use crate::hash::Hash;
use crate::objects::{frame_hash, ObjectKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub content: Vec<u8>,
}

impl Blob {
    pub fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read(path).with_path(path)?;
        Ok(Self::new(content))
    }

    /// The identity hash this blob would have once framed, independent of
    /// whether it has been written to the object store.
    pub fn hash(&self) -> Hash {
        frame_hash(ObjectKind::Blob, &self.content)
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn as_text(&self) -> Option<String> {
        String::from_utf8(self.content.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_known_value() {
        let blob = Blob::new(b"test content\n".to_vec());
        assert_eq!(blob.hash().to_hex(), "d670460b4b4aece5915caf5c68d12f560a9fe3e4");
    }

    #[test]
    fn as_text_rejects_binary() {
        let binary = Blob::new(vec![0xFF, 0xFE, 0x00]);
        assert!(binary.as_text().is_none());
        let text = Blob::new(b"hello".to_vec());
        assert_eq!(text.as_text(), Some("hello".to_string()));
    }
}
