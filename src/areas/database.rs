//! Content-addressed object store
//!
//! Objects live under `objects/` sharded by the first two hex digits of
//! their id. The stored form is the zlib-compressed frame
//! `{type} {size}\0{payload}`; identity is the SHA-1 of the uncompressed
//! frame, so it is invariant under storage.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use crate::error::VesError;
use anyhow::Context;
use bytes::Bytes;
use std::io::{BufRead, Cursor, Read, Write};
use std::path::Path;
use tracing::{debug, trace};

#[derive(Debug)]
pub struct Database {
    /// Path to the objects directory
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Store an object, returning its identity
    ///
    /// Content-addressed: when the sharded path already exists the write is
    /// skipped entirely and the existing identity is returned.
    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let oid = object.object_id()?;
        let object_path = self.path.join(oid.to_path());

        if !object_path.exists() {
            let parent = object_path
                .parent()
                .with_context(|| format!("invalid object path {}", object_path.display()))?;
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create object directory {}", parent.display())
            })?;

            self.write_object(&object_path, object.serialize()?)?;
            debug!(oid = %oid, kind = %object.object_type(), "stored object");
        } else {
            trace!(oid = %oid, "object already present");
        }

        Ok(oid)
    }

    /// Compute an object's identity without touching the filesystem
    pub fn hash(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        object.object_id()
    }

    /// Load and decompress the full frame of an object
    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let object_path = self.path.join(object_id.to_path());

        if !object_path.exists() {
            anyhow::bail!(VesError::ObjectNotFound(object_id.to_string()));
        }

        let compressed = std::fs::read(&object_path)
            .with_context(|| format!("failed to read object file {}", object_path.display()))?;

        Self::decompress(&compressed)
            .map_err(|_| VesError::MalformedObject(format!("{object_id}: bad zlib stream")).into())
    }

    /// Parse an object into its typed in-memory form, dispatching on the
    /// header's type tag
    pub fn parse_object(&self, object_id: &ObjectId) -> anyhow::Result<ObjectBox> {
        let (object_type, reader) = self.open_payload(object_id)?;

        match object_type {
            ObjectType::Blob => Ok(ObjectBox::Blob(Box::new(Blob::deserialize(reader)?))),
            ObjectType::Tree => Ok(ObjectBox::Tree(Box::new(Tree::deserialize(reader)?))),
            ObjectType::Commit => Ok(ObjectBox::Commit(Box::new(Commit::deserialize(reader)?))),
            ObjectType::Tag => Ok(ObjectBox::Tag(Box::new(Tag::deserialize(reader)?))),
        }
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> anyhow::Result<Option<Blob>> {
        let (object_type, reader) = self.open_payload(object_id)?;
        match object_type {
            ObjectType::Blob => Ok(Some(Blob::deserialize(reader)?)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> anyhow::Result<Option<Tree>> {
        let (object_type, reader) = self.open_payload(object_id)?;
        match object_type {
            ObjectType::Tree => Ok(Some(Tree::deserialize(reader)?)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        let (object_type, reader) = self.open_payload(object_id)?;
        match object_type {
            ObjectType::Commit => Ok(Some(Commit::deserialize(reader)?)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_tag(&self, object_id: &ObjectId) -> anyhow::Result<Option<Tag>> {
        let (object_type, reader) = self.open_payload(object_id)?;
        match object_type {
            ObjectType::Tag => Ok(Some(Tag::deserialize(reader)?)),
            _ => Ok(None),
        }
    }

    /// Type of an object without fully deserializing it
    pub fn object_type(&self, object_id: &ObjectId) -> anyhow::Result<ObjectType> {
        let (object_type, _) = self.open_payload(object_id)?;
        Ok(object_type)
    }

    /// Decompress, validate the header, and position a reader at the payload
    fn open_payload(&self, object_id: &ObjectId) -> anyhow::Result<(ObjectType, impl BufRead)> {
        let frame = self.load(object_id)?;
        let mut reader = Cursor::new(frame);

        let (object_type, declared_size) = ObjectType::parse_header(&mut reader)
            .with_context(|| format!("while reading object {object_id}"))?;

        let remaining = reader.get_ref().len() - reader.position() as usize;
        if declared_size != remaining {
            anyhow::bail!(VesError::MalformedObject(format!(
                "{object_id}: declared size {declared_size} but payload is {remaining} bytes"
            )));
        }

        Ok((object_type, reader))
    }

    fn write_object(&self, object_path: &Path, frame: Bytes) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .with_context(|| format!("invalid object path {}", object_path.display()))?;
        let temp_path = object_dir.join(Self::generate_temp_name());

        let compressed = Self::compress(&frame)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .with_context(|| format!("failed to open temp object {}", temp_path.display()))?;
        file.write_all(&compressed)
            .with_context(|| format!("failed to write temp object {}", temp_path.display()))?;

        // rename makes the object visible atomically
        std::fs::rename(&temp_path, object_path)
            .with_context(|| format!("failed to rename object into {}", object_path.display()))?;

        Ok(())
    }

    fn compress(data: &[u8]) -> anyhow::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(data)
            .context("failed to compress object content")?;

        encoder
            .finish()
            .map(Bytes::from)
            .context("failed to finish compressing object content")
    }

    fn decompress(data: &[u8]) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .context("failed to decompress object content")?;

        Ok(Bytes::from(decompressed))
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }

    /// All object ids starting with a hex prefix (lowercased by the caller)
    ///
    /// Enumerates `objects/{prefix[0:2]}/` and filters by the remainder, so
    /// only one shard directory is ever scanned.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        let mut matches = Vec::new();

        if prefix.len() < 2 {
            return Ok(matches);
        }

        let dir_name = &prefix[..2];
        let file_prefix = &prefix[2..];
        let dir_path = self.path.join(dir_name);

        if dir_path.is_dir() {
            for entry in std::fs::read_dir(&dir_path)? {
                let entry = entry?;
                let file_name = entry.file_name();
                let file_name = file_name.to_string_lossy();

                if file_name.starts_with(file_prefix) {
                    if let Ok(oid) = ObjectId::try_parse(format!("{dir_name}{file_name}")) {
                        matches.push(oid);
                    }
                }
            }
        }

        matches.sort();
        Ok(matches)
    }
}
