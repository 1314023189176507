//! Commit object
//!
//! A commit names a tree, zero or more parent commits, an author, a
//! committer, and a message, all carried in the KVLM envelope:
//!
//! ```text
//! tree <tree-oid>
//! parent <parent-oid>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <message>
//! ```
//!
//! The envelope is kept verbatim so that re-serializing a parsed commit
//! reproduces the exact bytes it was read from.

use crate::artifacts::kvlm::Kvlm;
use crate::artifacts::objects::object::{frame, Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::error::VesError;
use anyhow::Context;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, TimeZone};
use std::io::{BufRead, Read};

/// Author or committer identity with timestamp and timezone
///
/// Rendered as `Name <email> seconds ±HHMM`, bit-exact including the
/// timezone offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    name: String,
    email: String,
    timestamp: DateTime<FixedOffset>,
}

impl Signature {
    pub fn new(name: String, email: String, timestamp: DateTime<FixedOffset>) -> Self {
        Signature {
            name,
            email,
            timestamp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// `Name <email>` without the timestamp
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// The full identity line as stored in commit and tag headers
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

}

impl TryFrom<&str> for Signature {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // "Name <email> timestamp timezone", split from the right
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            anyhow::bail!(VesError::MalformedObject(format!(
                "invalid identity line: {value}"
            )));
        }

        let offset = parse_timezone(parts[0])?;
        let seconds = parts[1]
            .parse::<i64>()
            .map_err(|_| VesError::MalformedObject(format!("invalid timestamp in: {value}")))?;
        let name_email = parts[2];

        let email_start = name_email.find('<').ok_or_else(|| {
            VesError::MalformedObject(format!("missing '<' in identity: {value}"))
        })?;
        let email_end = name_email.find('>').ok_or_else(|| {
            VesError::MalformedObject(format!("missing '>' in identity: {value}"))
        })?;

        let name = name_email[..email_start].trim_end().to_string();
        let email = name_email[email_start + 1..email_end].to_string();

        let timestamp = offset
            .timestamp_opt(seconds, 0)
            .single()
            .ok_or_else(|| VesError::MalformedObject(format!("invalid timestamp in: {value}")))?;

        Ok(Signature {
            name,
            email,
            timestamp,
        })
    }
}

/// Parse a `±HHMM` timezone offset
fn parse_timezone(tz: &str) -> anyhow::Result<FixedOffset> {
    let malformed = || VesError::MalformedObject(format!("invalid timezone offset: {tz}"));

    let bytes = tz.as_bytes();
    if bytes.len() != 5 || (bytes[0] != b'+' && bytes[0] != b'-') {
        anyhow::bail!(malformed());
    }
    let hours: i32 = tz[1..3].parse().map_err(|_| malformed())?;
    let minutes: i32 = tz[3..5].parse().map_err(|_| malformed())?;
    let seconds = (hours * 60 + minutes) * 60;

    let offset = if bytes[0] == b'+' {
        FixedOffset::east_opt(seconds)
    } else {
        FixedOffset::west_opt(seconds)
    };

    offset.ok_or_else(|| malformed().into())
}

/// Commit object, backed by its KVLM envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    kvlm: Kvlm,
}

impl Commit {
    /// Compose a new commit
    ///
    /// Parent order is preserved; the message is stored verbatim.
    pub fn new(
        tree_oid: &ObjectId,
        parents: &[ObjectId],
        author: &Signature,
        committer: &Signature,
        message: &str,
    ) -> Self {
        let mut kvlm = Kvlm::new();
        kvlm.push(&b"tree"[..], tree_oid.as_ref().as_bytes().to_vec());
        for parent in parents {
            kvlm.push(&b"parent"[..], parent.as_ref().as_bytes().to_vec());
        }
        kvlm.push(&b"author"[..], author.display().into_bytes());
        kvlm.push(&b"committer"[..], committer.display().into_bytes());
        kvlm.set_message(message.as_bytes().to_vec());

        Commit { kvlm }
    }

    pub fn tree_oid(&self) -> anyhow::Result<ObjectId> {
        let value = self.kvlm.single(b"tree")?;
        ObjectId::try_parse(String::from_utf8_lossy(value).to_string())
    }

    pub fn parents(&self) -> anyhow::Result<Vec<ObjectId>> {
        self.kvlm
            .values(b"parent")
            .iter()
            .map(|value| ObjectId::try_parse(String::from_utf8_lossy(value).to_string()))
            .collect()
    }

    pub fn author(&self) -> anyhow::Result<Signature> {
        let value = self.kvlm.single(b"author")?;
        Signature::try_from(
            std::str::from_utf8(value).context("author identity is not valid UTF-8")?,
        )
    }

    pub fn committer(&self) -> anyhow::Result<Signature> {
        let value = self.kvlm.single(b"committer")?;
        Signature::try_from(
            std::str::from_utf8(value).context("committer identity is not valid UTF-8")?,
        )
    }

    pub fn message(&self) -> Bytes {
        self.kvlm.message().clone()
    }

    /// First line of the message, for short-form display
    pub fn short_message(&self) -> String {
        String::from_utf8_lossy(self.kvlm.message())
            .lines()
            .next()
            .unwrap_or("")
            .to_string()
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        frame(ObjectType::Commit, &self.kvlm.serialize())
    }
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;

        let commit = Commit {
            kvlm: Kvlm::parse(&payload)?,
        };

        // validate the recognized headers eagerly
        commit.tree_oid()?;
        commit.parents()?;
        commit.author()?;
        commit.committer()?;

        Ok(commit)
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        String::from_utf8_lossy(&self.kvlm.serialize()).to_string()
    }
}
