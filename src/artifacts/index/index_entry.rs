//! Index entry representation
//!
//! Each entry carries a staged path together with the full filesystem stat of
//! the file at staging time and the blob hash of its content. The stat fields
//! let change detection skip rehashing files whose metadata is untouched.
//!
//! ## On-disk form
//!
//! A 62-byte fixed prefix (ten big-endian u32 stat words, the 20-byte raw
//! hash, a u16 flags word), the NUL-terminated name, then 1-8 NUL bytes so
//! the entry length is a multiple of 8.

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::error::VesError;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use is_executable::IsExecutable;
use std::cmp::min;
use std::fs::Metadata;
use std::io::Write;
use std::os::unix::prelude::MetadataExt;
use std::path::Path;

/// Largest name length representable in the 12-bit flags field; longer names
/// store 0xFFF and are read until the NUL terminator
pub const MAX_NAME_FLAG: usize = 0xFFF;

/// Block size for entry alignment
pub const ENTRY_BLOCK: usize = 8;

/// Length of the fixed prefix before the name
pub const ENTRY_PREFIX_SIZE: usize = 62;

/// Smallest possible whole entry (prefix + one name byte + padding)
pub const ENTRY_MIN_SIZE: usize = 64;

/// A staged path with its blob hash and stat metadata
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// Path relative to the worktree, forward slashes
    pub name: String,
    /// Blob hash of the staged content
    pub oid: ObjectId,
    /// Filesystem stat captured at staging time
    pub metadata: EntryMetadata,
    /// Flag bits (assume-valid, merge stage)
    pub flags: EntryFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, new)]
pub struct EntryFlags {
    pub assume_valid: bool,
    /// Merge stage, 0-3
    pub stage: u8,
}

/// Stat fields recorded per entry, all 32-bit unsigned on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryMetadata {
    pub ctime: u32,
    pub ctime_nsec: u32,
    pub mtime: u32,
    pub mtime_nsec: u32,
    pub dev: u32,
    pub ino: u32,
    pub mode: EntryMode,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
}

impl IndexEntry {
    /// Directory prefixes of this entry's name, shortest first
    ///
    /// `a/b/c.txt` yields `["a", "a/b"]`.
    pub fn parent_dirs(&self) -> Vec<String> {
        let mut dirs = Vec::new();

        for (i, c) in self.name.char_indices() {
            if c == '/' {
                dirs.push(self.name[..i].to_string());
            }
        }

        dirs
    }

    /// Stat fast-path comparison used by change detection: mtime pair, size,
    /// and the type/permission bits. Other recorded fields vary across
    /// checkouts and are not portable.
    pub fn stat_match(&self, other: &EntryMetadata) -> bool {
        self.metadata.mtime == other.mtime
            && self.metadata.mtime_nsec == other.mtime_nsec
            && self.metadata.size == other.size
            && self.metadata.mode == other.mode
    }

    /// Serialize to the on-disk form, padding included
    pub fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut bytes = Vec::with_capacity(ENTRY_PREFIX_SIZE + self.name.len() + ENTRY_BLOCK);

        bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime_nsec)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime_nsec)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.dev)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ino)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mode.as_u32())?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.uid)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.gid)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.size)?;
        self.oid.write_raw_to(&mut bytes)?;
        bytes.write_u16::<byteorder::NetworkEndian>(self.flags_word())?;
        bytes.write_all(self.name.as_bytes())?;

        // pad with 1-8 NULs up to the next multiple of 8; a name that already
        // lands on the boundary still gets a full block of NULs so the
        // terminator is always present
        let pad = ENTRY_BLOCK - (bytes.len() % ENTRY_BLOCK);
        bytes.resize(bytes.len() + pad, 0);

        Ok(Bytes::from(bytes))
    }

    fn flags_word(&self) -> u16 {
        let mut flags = min(self.name.len(), MAX_NAME_FLAG) as u16;
        flags |= u16::from(self.flags.stage & 0b11) << 12;
        if self.flags.assume_valid {
            flags |= 1 << 15;
        }
        flags
    }

    /// Parse one whole entry (prefix, name, and padding)
    pub fn deserialize(bytes: &[u8]) -> anyhow::Result<Self> {
        if bytes.len() < ENTRY_MIN_SIZE {
            anyhow::bail!(VesError::MalformedIndex("truncated entry".to_string()));
        }

        let ctime = byteorder::NetworkEndian::read_u32(&bytes[0..4]);
        let ctime_nsec = byteorder::NetworkEndian::read_u32(&bytes[4..8]);
        let mtime = byteorder::NetworkEndian::read_u32(&bytes[8..12]);
        let mtime_nsec = byteorder::NetworkEndian::read_u32(&bytes[12..16]);
        let dev = byteorder::NetworkEndian::read_u32(&bytes[16..20]);
        let ino = byteorder::NetworkEndian::read_u32(&bytes[20..24]);
        let mode = EntryMode::try_from(byteorder::NetworkEndian::read_u32(&bytes[24..28]))?;
        let uid = byteorder::NetworkEndian::read_u32(&bytes[28..32]);
        let gid = byteorder::NetworkEndian::read_u32(&bytes[32..36]);
        let size = byteorder::NetworkEndian::read_u32(&bytes[36..40]);
        let mut oid_reader = std::io::Cursor::new(&bytes[40..60]);
        let oid = ObjectId::read_raw_from(&mut oid_reader)?;
        let flags = byteorder::NetworkEndian::read_u16(&bytes[60..62]);

        if flags & (1 << 14) != 0 {
            anyhow::bail!(VesError::MalformedIndex(
                "extended entries are not supported".to_string()
            ));
        }
        let assume_valid = flags & (1 << 15) != 0;
        let stage = ((flags >> 12) & 0b11) as u8;
        let name_length = (flags & MAX_NAME_FLAG as u16) as usize;

        let name_bytes = if name_length < MAX_NAME_FLAG {
            let end = ENTRY_PREFIX_SIZE + name_length;
            if bytes.len() <= end || bytes[end] != 0 {
                anyhow::bail!(VesError::MalformedIndex(
                    "entry name is not NUL-terminated".to_string()
                ));
            }
            &bytes[ENTRY_PREFIX_SIZE..end]
        } else {
            // name length >= 0xFFF: scan for the terminator instead
            let terminator = bytes[ENTRY_PREFIX_SIZE + MAX_NAME_FLAG..]
                .iter()
                .position(|&b| b == 0)
                .map(|i| ENTRY_PREFIX_SIZE + MAX_NAME_FLAG + i)
                .ok_or_else(|| {
                    VesError::MalformedIndex("entry name is not NUL-terminated".to_string())
                })?;
            &bytes[ENTRY_PREFIX_SIZE..terminator]
        };

        let name = std::str::from_utf8(name_bytes)
            .map_err(|_| VesError::MalformedIndex("entry name is not valid UTF-8".to_string()))?
            .to_string();
        validate_entry_name(&name)?;

        Ok(IndexEntry {
            name,
            oid,
            metadata: EntryMetadata {
                ctime,
                ctime_nsec,
                mtime,
                mtime_nsec,
                dev,
                ino,
                mode,
                uid,
                gid,
                size,
            },
            flags: EntryFlags {
                assume_valid,
                stage,
            },
        })
    }

    /// Entry key in index order: name then stage
    pub fn sort_key(&self) -> (String, u8) {
        (self.name.clone(), self.flags.stage)
    }
}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .cmp(&other.name)
            .then(self.flags.stage.cmp(&other.flags.stage))
    }
}

/// Enforce the path constraints for staged names: relative to the worktree,
/// forward slashes, non-empty, no NUL, no `..` escape
pub fn validate_entry_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty() {
        anyhow::bail!(VesError::InvalidPath("empty path".to_string()));
    }
    if name.starts_with('/') {
        anyhow::bail!(VesError::InvalidPath(format!("absolute path: {name}")));
    }
    if name.ends_with('/') {
        anyhow::bail!(VesError::InvalidPath(format!("trailing slash: {name}")));
    }
    if name.contains('\0') {
        anyhow::bail!(VesError::InvalidPath("path contains NUL".to_string()));
    }
    if name.split('/').any(|component| component == "..") {
        anyhow::bail!(VesError::InvalidPath(format!(
            "path escapes the worktree: {name}"
        )));
    }

    Ok(())
}

impl TryFrom<(&Path, &Metadata)> for EntryMetadata {
    type Error = anyhow::Error;

    /// Capture stat fields from the filesystem; `path` is the absolute path
    /// used only for the executable-bit probe
    fn try_from((path, metadata): (&Path, &Metadata)) -> Result<Self, Self::Error> {
        let mode = if metadata.file_type().is_symlink() {
            EntryMode::Symlink
        } else if path.is_executable() {
            EntryMode::Executable
        } else {
            EntryMode::Regular
        };

        Ok(Self {
            ctime: metadata.ctime() as u32,
            ctime_nsec: metadata.ctime_nsec() as u32,
            mtime: metadata.mtime() as u32,
            mtime_nsec: metadata.mtime_nsec() as u32,
            dev: metadata.dev() as u32,
            ino: metadata.ino() as u32,
            mode,
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size() as u32,
        })
    }
}
