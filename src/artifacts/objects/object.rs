//! Core object traits
//!
//! - `Packable`: serialization to the framed binary form
//! - `Unpackable`: deserialization from the payload (header already consumed)
//! - `Object`: common operations (id computation, display)
//!
//! The framed form is `{type} {size}\0{payload}`; the object id is the SHA-1
//! of that frame, computed before compression.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Trait for serializing objects to the framed binary form
pub trait Packable {
    /// Serialize the object to bytes, header included
    fn serialize(&self) -> Result<Bytes>;
}

/// Trait for deserializing objects from their payload bytes
pub trait Unpackable {
    /// Deserialize the object from a reader positioned after the header
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

/// Common object operations, implemented by all four object types
pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    /// Human-readable rendition of the payload
    fn display(&self) -> String;

    /// Compute the object id: SHA-1 over the framed serialization
    fn object_id(&self) -> Result<ObjectId> {
        let content = self.serialize()?;
        let mut hasher = Sha1::new();
        hasher.update(&content);

        ObjectId::from_digest(&hasher.finalize())
    }

    /// Sharded path where this object would be stored
    fn object_path(&self) -> Result<PathBuf> {
        Ok(self.object_id()?.to_path())
    }
}

/// Compose the framed bytes `{type} {size}\0{payload}`
pub fn frame(object_type: ObjectType, payload: &[u8]) -> Result<Bytes> {
    let mut framed = Vec::with_capacity(payload.len() + 16);
    write!(framed, "{} {}\0", object_type.as_str(), payload.len())?;
    framed.write_all(payload)?;

    Ok(Bytes::from(framed))
}

/// Type-erased object container for read-time dispatch
///
/// The variant is chosen from the textual type tag in the framed header.
pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
    Tag(Box<Tag>),
}

impl ObjectBox {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(_) => ObjectType::Blob,
            ObjectBox::Tree(_) => ObjectType::Tree,
            ObjectBox::Commit(_) => ObjectType::Commit,
            ObjectBox::Tag(_) => ObjectType::Tag,
        }
    }

    pub fn display(&self) -> String {
        match self {
            ObjectBox::Blob(blob) => blob.display(),
            ObjectBox::Tree(tree) => tree.display(),
            ObjectBox::Commit(commit) => commit.display(),
            ObjectBox::Tag(tag) => tag.display(),
        }
    }
}
