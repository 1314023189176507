//! Staging index
//!
//! In-memory view of the binary staging file. Entries are kept unique by
//! (name, stage) and globally ordered by name then stage; a `children` map
//! mirrors the directory hierarchy so file/directory replacements and
//! tracking queries stay cheap.
//!
//! Mutations are batched in memory and persisted with `write_updates`,
//! which writes a sibling temp file and renames it over the index so a
//! crashed writer never leaves a torn file behind.

use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{
    validate_entry_name, IndexEntry, ENTRY_BLOCK, ENTRY_MIN_SIZE,
};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{CHECKSUM_SIZE, HEADER_SIZE, SIGNATURE, VERSION};
use crate::error::VesError;
use anyhow::Context;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (`.ves/index`)
    path: Box<Path>,
    /// Staged entries keyed by (name, stage)
    entries: BTreeMap<(String, u8), IndexEntry>,
    /// Directory -> staged paths beneath it
    children: BTreeMap<String, BTreeSet<String>>,
    header: IndexHeader,
    /// Set when the in-memory state has diverged from disk
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
            header: IndexHeader::empty(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stage-0 entry for a path
    pub fn entry_by_path(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.get(&(name.to_string(), 0))
    }

    /// True when the path is a staged file or a directory containing one
    pub fn is_directly_tracked(&self, name: &str) -> bool {
        self.entries.contains_key(&(name.to_string(), 0)) || self.children.contains_key(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.children.clear();
        self.header = IndexHeader::empty();
        self.changed = false;
    }

    /// Load the index from disk, verifying structure and trailer
    ///
    /// A missing file is a new repository: the index is simply empty.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        self.clear();

        if !self.path.exists() {
            return Ok(());
        }

        let raw = std::fs::read(&self.path)
            .with_context(|| format!("failed to read index at {}", self.path.display()))?;
        if raw.len() < HEADER_SIZE + CHECKSUM_SIZE {
            anyhow::bail!(VesError::MalformedIndex("file is truncated".to_string()));
        }

        let mut reader = Checksum::new(Cursor::new(raw.as_slice()));
        let mut consumed = 0;

        let header_bytes = reader.read(HEADER_SIZE)?;
        consumed += HEADER_SIZE;
        let header = IndexHeader::parse(&header_bytes)?;

        if header.marker != SIGNATURE {
            anyhow::bail!(VesError::MalformedIndex(format!(
                "invalid signature {:?}",
                header.marker
            )));
        }
        if header.version != VERSION {
            anyhow::bail!(VesError::MalformedIndex(format!(
                "unsupported version {}",
                header.version
            )));
        }

        let mut previous_key: Option<(String, u8)> = None;
        for _ in 0..header.entries_count {
            // entries are 8-byte aligned and NUL-padded, so read the fixed
            // minimum and extend block-wise until the terminator appears
            let mut entry_bytes = reader.read(ENTRY_MIN_SIZE)?.to_vec();
            consumed += ENTRY_MIN_SIZE;
            while entry_bytes[entry_bytes.len() - 1] != 0 {
                entry_bytes.extend_from_slice(&reader.read(ENTRY_BLOCK)?);
                consumed += ENTRY_BLOCK;
            }

            let entry = IndexEntry::deserialize(&entry_bytes)?;
            let key = entry.sort_key();

            if let Some(previous) = &previous_key {
                if *previous >= key {
                    anyhow::bail!(VesError::MalformedIndex(format!(
                        "entries out of order near {}",
                        entry.name
                    )));
                }
            }
            previous_key = Some(key);

            self.store_entry(entry);
        }

        // optional extensions sit between the entries and the trailer; they
        // are ignored but still count toward the trailer hash
        let extensions_len = raw
            .len()
            .checked_sub(CHECKSUM_SIZE + consumed)
            .ok_or_else(|| VesError::MalformedIndex("file is truncated".to_string()))?;
        if extensions_len > 0 {
            reader.read(extensions_len)?;
        }

        reader.verify()?;
        self.header = header;
        self.changed = false;

        debug!(entries = self.entries.len(), "index loaded");
        Ok(())
    }

    /// Persist the current state atomically
    ///
    /// A no-op when nothing changed since the last load and the file is
    /// already on disk.
    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        if !self.changed && self.path.exists() {
            return Ok(());
        }

        let parent = self
            .path
            .parent()
            .with_context(|| format!("invalid index path {}", self.path.display()))?;
        let temp_path = parent.join(format!("tmp-index-{}", rand::random::<u32>()));

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .with_context(|| format!("failed to open temp index {}", temp_path.display()))?;
        let mut writer = Checksum::new(file);

        self.header = IndexHeader::new(
            SIGNATURE.to_string(),
            VERSION,
            self.entries.len() as u32,
        );
        writer.write(&self.header.serialize()?)?;

        for entry in self.entries.values() {
            writer.write(&entry.serialize()?)?;
        }

        writer.write_checksum()?;
        drop(writer);

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("failed to rename index into {}", self.path.display()))?;
        self.changed = false;

        debug!(entries = self.entries.len(), "index written");
        Ok(())
    }

    /// Insert an entry, evicting anything it conflicts with
    ///
    /// Staging `a/b` removes a staged file named `a`; staging `a` removes
    /// everything staged beneath `a/`.
    pub fn add(&mut self, entry: IndexEntry) -> anyhow::Result<()> {
        validate_entry_name(&entry.name)?;

        self.discard_conflicts(&entry);
        self.store_entry(entry);
        self.changed = true;

        Ok(())
    }

    /// Delete all stages of a name (and any staged children if the name is
    /// a directory)
    pub fn remove(&mut self, name: &str) {
        let removed_entry = self.remove_entry(name);
        let removed_children = self.remove_children(name);

        if removed_entry || removed_children {
            self.changed = true;
        }
    }

    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            self.remove_entry(&parent);
        }
        self.remove_children(&entry.name);
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.children
                .entry(parent)
                .or_default()
                .insert(entry.name.clone());
        }

        self.entries.insert(entry.sort_key(), entry);
    }

    fn remove_entry(&mut self, name: &str) -> bool {
        let keys: Vec<(String, u8)> = self
            .entries
            .range((name.to_string(), 0)..=(name.to_string(), 3))
            .map(|(key, _)| key.clone())
            .collect();

        let mut removed = false;
        for key in keys {
            if let Some(entry) = self.entries.remove(&key) {
                removed = true;
                for parent in entry.parent_dirs() {
                    if let Some(children) = self.children.get_mut(&parent) {
                        children.remove(&entry.name);
                        if children.is_empty() {
                            self.children.remove(&parent);
                        }
                    }
                }
            }
        }

        removed
    }

    fn remove_children(&mut self, name: &str) -> bool {
        let mut removed = false;
        if let Some(children) = self.children.remove(name) {
            for child in children {
                removed |= self.remove_entry(&child);
            }
        }
        removed
    }
}
