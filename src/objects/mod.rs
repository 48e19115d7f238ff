//! The three object kinds, as a tagged variant with a single parse entry
//! point that dispatches on the type tag carried in the frame header (§9
//! "Polymorphic objects") — never via runtime type reflection.
//!
//! Serialized form of every object is `"<type> <length>\0<payload>"`,
//! DEFLATE-compressed at rest by the object store. The object's identity is
//! the SHA-1 of the uncompressed framed form; framing itself lives in
//! [`crate::store`], since it's shared by all three kinds.

pub mod blob;
pub mod commit;
pub mod tree;

pub use blob::Blob;
pub use commit::{Commit, Person};
pub use tree::{FileMode, Tree, TreeEntry};

use crate::error::Error;
use crate::hash::Hash;

/// The type tag carried in an object's frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        }
    }

    pub fn parse(tag: &str) -> crate::error::Result<Self> {
        match tag {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            other => Err(Error::corrupt(format!("unknown object type tag '{}'", other))),
        }
    }
}

/// A fully parsed object of any kind.
#[derive(Debug, Clone)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Blob(_) => ObjectKind::Blob,
            Object::Tree(_) => ObjectKind::Tree,
            Object::Commit(_) => ObjectKind::Commit,
        }
    }

    /// Serialize just the payload (without the `"<type> <len>\0"` frame).
    pub fn serialize_payload(&self) -> Vec<u8> {
        match self {
            Object::Blob(b) => b.content.clone(),
            Object::Tree(t) => t.serialize(),
            Object::Commit(c) => c.serialize().into_bytes(),
        }
    }

    /// Parse a payload given the kind already extracted from the frame
    /// header. This is the single dispatch point every reader goes
    /// through.
    pub fn parse(kind: ObjectKind, payload: &[u8]) -> crate::error::Result<Self> {
        match kind {
            ObjectKind::Blob => Ok(Object::Blob(Blob::new(payload.to_vec()))),
            ObjectKind::Tree => Ok(Object::Tree(Tree::parse(payload)?)),
            ObjectKind::Commit => {
                let text = std::str::from_utf8(payload)
                    .map_err(|_| Error::corrupt("commit payload is not valid UTF-8"))?;
                Ok(Object::Commit(Commit::parse(text)?))
            }
        }
    }

    pub fn as_tree(&self) -> crate::error::Result<&Tree> {
        match self {
            Object::Tree(t) => Ok(t),
            other => Err(Error::corrupt(format!(
                "expected tree object, found {}",
                other.kind().as_str()
            ))),
        }
    }

    pub fn as_commit(&self) -> crate::error::Result<&Commit> {
        match self {
            Object::Commit(c) => Ok(c),
            other => Err(Error::corrupt(format!(
                "expected commit object, found {}",
                other.kind().as_str()
            ))),
        }
    }

    pub fn as_blob(&self) -> crate::error::Result<&Blob> {
        match self {
            Object::Blob(b) => Ok(b),
            other => Err(Error::corrupt(format!(
                "expected blob object, found {}",
                other.kind().as_str()
            ))),
        }
    }
}

/// Compute the identity hash of an object as it would be written: the
/// SHA-1 of `"<type> <len>\0<payload>"`.
pub fn frame_hash(kind: ObjectKind, payload: &[u8]) -> Hash {
    let header = format!("{} {}\0", kind.as_str(), payload.len());
    let mut framed = Vec::with_capacity(header.len() + payload.len());
    framed.extend_from_slice(header.as_bytes());
    framed.extend_from_slice(payload);
    Hash::of(&framed)
}
