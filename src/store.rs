//! The object store: a content-addressed, write-once database of blobs,
//! trees, and commits, DEFLATE-compressed at rest under a fan-out
//! directory layout (`<hash[:2]>/<hash[2:]>`).
//!
//! Writes go through a temp file in the object directory, `fsync`ed and
//! renamed into place, so a reader never observes a partially written
//! object — unlike a direct `fs::write`, which can leave a truncated file
//! behind if the process is killed mid-write.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::objects::{frame_hash, Object, ObjectKind};

pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: objects_dir.into(),
        }
    }

    fn object_path(&self, hash: &Hash) -> PathBuf {
        let (prefix, rest) = hash.to_path_components();
        self.root.join(prefix).join(rest)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.object_path(hash).exists()
    }

    /// Frame, compress and write an object, returning its hash. A no-op if
    /// the object is already present — objects are immutable once written.
    pub fn write(&self, object: &Object) -> Result<Hash> {
        let payload = object.serialize_payload();
        let hash = frame_hash(object.kind(), &payload);

        if self.contains(&hash) {
            tracing::trace!(%hash, kind = object.kind().as_str(), "object already present");
            return Ok(hash);
        }

        let dir = self.object_path(&hash).parent().unwrap().to_path_buf();
        fs::create_dir_all(&dir).with_path(&dir)?;

        let header = format!("{} {}\0", object.kind().as_str(), payload.len());
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(header.as_bytes()).with_path(&dir)?;
        encoder.write_all(&payload).with_path(&dir)?;
        let compressed = encoder.finish().with_path(&dir)?;

        let final_path = self.object_path(&hash);
        let tmp_path = dir.join(format!(".tmp-{}", std::process::id()));

        let mut tmp_file = fs::File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(&compressed).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
        drop(tmp_file);

        fs::rename(&tmp_path, &final_path).with_path(&final_path)?;
        tracing::debug!(%hash, kind = object.kind().as_str(), bytes = payload.len(), "wrote object");

        Ok(hash)
    }

    /// Read and parse the object with the given hash.
    pub fn read(&self, hash: &Hash) -> Result<Object> {
        let (kind, payload) = self.read_framed(hash)?;
        Object::parse(kind, &payload)
    }

    /// Read an object's frame without parsing the payload, for callers
    /// that only need the raw bytes (e.g. `cat-file`-style inspection).
    pub fn read_framed(&self, hash: &Hash) -> Result<(ObjectKind, Vec<u8>)> {
        let path = self.object_path(hash);
        if !path.exists() {
            return Err(Error::not_found(format!("object {}", hash)));
        }

        let compressed = fs::read(&path).with_path(&path)?;
        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| Error::corrupt(format!("object {} failed to decompress: {}", hash, e)))?;

        let null_pos = decompressed
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::corrupt(format!("object {} has no header terminator", hash)))?;

        let header = std::str::from_utf8(&decompressed[..null_pos])
            .map_err(|_| Error::corrupt(format!("object {} header is not valid UTF-8", hash)))?;
        let mut parts = header.splitn(2, ' ');
        let kind_tag = parts
            .next()
            .ok_or_else(|| Error::corrupt(format!("object {} header missing type", hash)))?;
        let size: usize = parts
            .next()
            .ok_or_else(|| Error::corrupt(format!("object {} header missing size", hash)))?
            .parse()
            .map_err(|_| Error::corrupt(format!("object {} header size is not a number", hash)))?;

        let kind = ObjectKind::parse(kind_tag)?;
        let payload = decompressed[null_pos + 1..].to_vec();

        if payload.len() != size {
            return Err(Error::corrupt(format!(
                "object {} size mismatch: header says {}, got {}",
                hash,
                size,
                payload.len()
            )));
        }

        Ok((kind, payload))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
