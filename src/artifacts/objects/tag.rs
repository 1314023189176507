//! Annotated tag object
//!
//! Tags share the KVLM shape with commits; a reader distinguishes the two by
//! the framed header's type tag, not by field presence. Recognized headers
//! are `object`, `type`, `tag`, and `tagger`.

use crate::artifacts::kvlm::Kvlm;
use crate::artifacts::objects::object::{frame, Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::commit::Signature;
use anyhow::Context;
use bytes::Bytes;
use std::io::{BufRead, Read};

/// Annotated tag, backed by its KVLM envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    kvlm: Kvlm,
}

impl Tag {
    pub fn new(
        object: &ObjectId,
        object_type: ObjectType,
        name: &str,
        tagger: &Signature,
        message: &str,
    ) -> Self {
        let mut kvlm = Kvlm::new();
        kvlm.push(&b"object"[..], object.as_ref().as_bytes().to_vec());
        kvlm.push(&b"type"[..], object_type.as_str().as_bytes().to_vec());
        kvlm.push(&b"tag"[..], name.as_bytes().to_vec());
        kvlm.push(&b"tagger"[..], tagger.display().into_bytes());
        kvlm.set_message(message.as_bytes().to_vec());

        Tag { kvlm }
    }

    /// The object this tag points at
    pub fn target(&self) -> anyhow::Result<ObjectId> {
        let value = self.kvlm.single(b"object")?;
        ObjectId::try_parse(String::from_utf8_lossy(value).to_string())
    }

    /// The declared type of the target object
    pub fn target_type(&self) -> anyhow::Result<ObjectType> {
        let value = self.kvlm.single(b"type")?;
        ObjectType::try_from(std::str::from_utf8(value).context("type tag is not valid UTF-8")?)
    }

    pub fn name(&self) -> anyhow::Result<String> {
        let value = self.kvlm.single(b"tag")?;
        Ok(String::from_utf8_lossy(value).to_string())
    }

    pub fn tagger(&self) -> anyhow::Result<Signature> {
        let value = self.kvlm.single(b"tagger")?;
        Signature::try_from(std::str::from_utf8(value).context("tagger identity is not valid UTF-8")?)
    }

    pub fn message(&self) -> Bytes {
        self.kvlm.message().clone()
    }
}

impl Packable for Tag {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        frame(ObjectType::Tag, &self.kvlm.serialize())
    }
}

impl Unpackable for Tag {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;

        let tag = Tag {
            kvlm: Kvlm::parse(&payload)?,
        };

        tag.target()?;
        tag.target_type()?;
        tag.name()?;
        tag.tagger()?;

        Ok(tag)
    }
}

impl Object for Tag {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }

    fn display(&self) -> String {
        String::from_utf8_lossy(&self.kvlm.serialize()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn tagger() -> Signature {
        let timestamp = FixedOffset::east_opt(0)
            .unwrap()
            .timestamp_opt(0, 0)
            .single()
            .unwrap();
        Signature::new("T A Gger".to_string(), "t@g".to_string(), timestamp)
    }

    #[test]
    fn tag_serializes_all_headers() {
        let target =
            ObjectId::try_parse("ce013625030ba8dba906f756967f9e9ca394464a".to_string()).unwrap();
        let tag = Tag::new(&target, ObjectType::Commit, "v1.0", &tagger(), "release\n");

        let framed = tag.serialize().unwrap();
        let payload = b"object ce013625030ba8dba906f756967f9e9ca394464a\n\
type commit\n\
tag v1.0\n\
tagger T A Gger <t@g> 0 +0000\n\
\n\
release\n";
        let mut expected = format!("tag {}\0", payload.len()).into_bytes();
        expected.extend_from_slice(payload);
        assert_eq!(framed.as_ref(), expected.as_slice());
    }

    #[test]
    fn tag_round_trips_through_deserialize() {
        let target =
            ObjectId::try_parse("ce013625030ba8dba906f756967f9e9ca394464a".to_string()).unwrap();
        let tag = Tag::new(&target, ObjectType::Commit, "v1.0", &tagger(), "release\n");

        let framed = tag.serialize().unwrap();
        let header_end = framed.iter().position(|&b| b == 0).unwrap() + 1;
        let parsed = Tag::deserialize(Cursor::new(framed[header_end..].to_vec())).unwrap();

        assert_eq!(parsed.target().unwrap(), target);
        assert_eq!(parsed.target_type().unwrap(), ObjectType::Commit);
        assert_eq!(parsed.name().unwrap(), "v1.0");
        assert_eq!(parsed.message().as_ref(), b"release\n");
        assert_eq!(parsed, tag);
    }
}
