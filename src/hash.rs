//! 20-byte SHA-1 object identity.

use std::fmt;
use std::str::FromStr;

use sha1::{Digest, Sha1};

use crate::error::{Error, Result};

/// A SHA-1 hash, stored as raw bytes.
///
/// Equality is byte equality. [`Hash::ZERO`] is the sentinel meaning
/// "unset" used by operations that carry no blob (and must be rejected
/// wherever a real hash is required).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; 20]);

impl Hash {
    pub const LEN: usize = 20;
    pub const ZERO: Hash = Hash([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Build from a byte slice, failing with [`Error::Corrupt`] if the
    /// length is wrong.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::LEN {
            return Err(Error::Corrupt {
                message: format!("expected {}-byte hash, got {}", Self::LEN, bytes.len()),
            });
        }
        let mut buf = [0u8; 20];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Parse from a 40-character hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != 40 {
            return Err(Error::InvalidArgument {
                message: format!("'{}' is not a 40-character hash", s),
            });
        }
        let bytes = hex::decode(s).map_err(|_| Error::InvalidArgument {
            message: format!("'{}' is not valid hex", s),
        })?;
        Self::from_slice(&bytes)
    }

    /// Hash the SHA-1 of arbitrary bytes directly (used for the object
    /// framing hash and the index trailer).
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);
        let digest = hasher.finalize();
        let mut buf = [0u8; 20];
        buf.copy_from_slice(&digest);
        Self(buf)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 7 hex characters, used for human-readable output.
    pub fn short(&self) -> String {
        let full = self.to_hex();
        full[..7].to_string()
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Split the hex form into the fan-out `(prefix, remainder)` pair used
    /// by the object store's directory layout.
    pub fn to_path_components(&self) -> (String, String) {
        let hex = self.to_hex();
        (hex[..2].to_string(), hex[2..].to_string())
    }

    /// Try to resolve a hex string that may be abbreviated. This core does
    /// not index abbreviations, so anything shorter than 40 characters is
    /// accepted only if it already happens to be a full hash; true
    /// short-hash lookup is out of scope (Non-goals: no pack files, no
    /// object index beyond the fan-out directories).
    pub fn looks_like_hex(s: &str) -> bool {
        !s.is_empty() && s.len() <= 40 && s.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let h = Hash::of(b"blob 13\0Hello, World!");
        let hex = h.to_hex();
        let back = Hash::from_hex(&hex).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn known_blob_hash() {
        let framed = b"blob 13\0test content\n";
        let h = Hash::of(framed);
        assert_eq!(h.to_hex(), "d670460b4b4aece5915caf5c68d12f560a9fe3e4");
    }

    #[test]
    fn zero_is_sentinel() {
        assert!(Hash::ZERO.is_zero());
        assert_eq!(Hash::ZERO.to_hex(), "0".repeat(40));
    }

    #[test]
    fn rejects_bad_hex_length() {
        assert!(Hash::from_hex("abc").is_err());
    }

    #[test]
    fn path_components_split_fanout() {
        let h = Hash::from_hex("d670460b4b4aece5915caf5c68d12f560a9fe3e4").unwrap();
        let (prefix, rest) = h.to_path_components();
        assert_eq!(prefix, "d6");
        assert_eq!(rest, "70460b4b4aece5915caf5c68d12f560a9fe3e4");
    }

    #[test]
    fn short_is_first_seven() {
        let h = Hash::from_hex("d670460b4b4aece5915caf5c68d12f560a9fe3e4").unwrap();
        assert_eq!(h.short(), "d670460");
    }
}
