use crate::areas::repository::Repository;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use anyhow::Context;
use bytes::Bytes;
use std::io::{Cursor, Write};
use std::path::Path;

impl Repository {
    /// Hash a file as an object, optionally writing it to the store
    pub fn hash_object(
        &self,
        file: &Path,
        object_type: ObjectType,
        write: bool,
    ) -> anyhow::Result<()> {
        let data = std::fs::read(file)
            .with_context(|| format!("failed to read {}", file.display()))?;

        let oid = self.hash_bytes(Bytes::from(data), object_type, write)?;
        writeln!(self.writer(), "{oid}")?;

        Ok(())
    }

    /// Hash raw payload bytes as `object_type`
    ///
    /// Non-blob payloads are parsed first, so malformed input is rejected
    /// rather than stored.
    pub fn hash_bytes(
        &self,
        data: Bytes,
        object_type: ObjectType,
        write: bool,
    ) -> anyhow::Result<ObjectId> {
        match object_type {
            ObjectType::Blob => self.hash_one(&Blob::new(data), write),
            ObjectType::Commit => self.hash_one(&Commit::deserialize(Cursor::new(data))?, write),
            ObjectType::Tree => self.hash_one(&Tree::deserialize(Cursor::new(data))?, write),
            ObjectType::Tag => self.hash_one(&Tag::deserialize(Cursor::new(data))?, write),
        }
    }

    fn hash_one(&self, object: &impl Object, write: bool) -> anyhow::Result<ObjectId> {
        if write {
            self.database().store(object)
        } else {
            self.database().hash(object)
        }
    }
}
