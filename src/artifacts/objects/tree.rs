//! Tree object
//!
//! A tree enumerates one directory level: each entry is
//! `{mode} {name}\0{20-byte raw hash}`. Entries are kept in the canonical
//! order, which compares subtree names as if they carried a trailing `/`, so
//! equal trees always hash identically.
//!
//! `build_from_index` folds the flat staging list into a hierarchy of trees,
//! deepest directory first, so every subtree hash exists before the tree
//! that references it.

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::{frame, Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::error::VesError;
use bytes::Bytes;
use derive_new::new;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, Write};

/// One directory entry: a blob, subtree, symlink, or gitlink reference
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: String,
    pub oid: ObjectId,
}

impl TreeEntry {
    /// Sorting key implementing the virtual-slash rule: a subtree named
    /// `name` compares as `name/`
    fn canonical_key(&self) -> String {
        if self.mode.is_tree() {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn object_type(&self) -> ObjectType {
        if self.mode.is_tree() {
            ObjectType::Tree
        } else {
            ObjectType::Blob
        }
    }
}

/// A single directory snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

/// Result of folding an index into trees: the root hash plus every tree
/// produced along the way, ready to be stored
#[derive(Debug)]
pub struct BuiltTrees {
    pub root_oid: ObjectId,
    pub trees: Vec<Tree>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, rejecting duplicate names
    pub fn add_entry(&mut self, entry: TreeEntry) -> anyhow::Result<()> {
        if self.entries.iter().any(|e| e.name == entry.name) {
            anyhow::bail!(VesError::MalformedObject(format!(
                "duplicate tree entry name {}",
                entry.name
            )));
        }
        self.entries.push(entry);

        Ok(())
    }

    /// Entries in canonical order
    pub fn entries(&self) -> Vec<&TreeEntry> {
        let mut sorted: Vec<&TreeEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|entry| entry.canonical_key());
        sorted
    }

    /// Fold sorted index entries into a hierarchy of trees
    ///
    /// Directories are processed longest path first, which guarantees that
    /// when a directory's tree is assembled all its subtrees already have
    /// hashes. Identical subtrees in different parents dedup naturally
    /// through content addressing. An empty index yields the empty tree.
    pub fn build_from_index<'e>(
        entries: impl Iterator<Item = &'e IndexEntry>,
    ) -> anyhow::Result<BuiltTrees> {
        // group direct file children by their containing directory and make
        // sure every intermediate directory has a group, the root included
        let mut groups: BTreeMap<String, Vec<&IndexEntry>> = BTreeMap::new();
        groups.insert(String::new(), Vec::new());

        for entry in entries {
            for parent in entry.parent_dirs() {
                groups.entry(parent).or_default();
            }
            let dir = match entry.name.rfind('/') {
                Some(i) => entry.name[..i].to_string(),
                None => String::new(),
            };
            groups.entry(dir).or_default().push(entry);
        }

        // immediate subdirectory relation
        let mut subdirs: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for dir in groups.keys().filter(|d| !d.is_empty()) {
            let parent = match dir.rfind('/') {
                Some(i) => dir[..i].to_string(),
                None => String::new(),
            };
            subdirs.entry(parent).or_default().insert(dir.clone());
        }

        let mut order: Vec<&String> = groups.keys().collect();
        order.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

        let mut tree_oids: BTreeMap<String, ObjectId> = BTreeMap::new();
        let mut trees = Vec::with_capacity(order.len());

        for dir in order {
            let mut tree = Tree::new();

            for entry in &groups[dir] {
                let basename = match entry.name.rfind('/') {
                    Some(i) => &entry.name[i + 1..],
                    None => entry.name.as_str(),
                };
                tree.add_entry(TreeEntry::new(
                    entry.metadata.mode,
                    basename.to_string(),
                    entry.oid.clone(),
                ))?;
            }

            if let Some(children) = subdirs.get(dir) {
                for child in children {
                    let basename = match child.rfind('/') {
                        Some(i) => &child[i + 1..],
                        None => child.as_str(),
                    };
                    let child_oid = tree_oids
                        .get(child)
                        .cloned()
                        .expect("subtree built before its parent");
                    tree.add_entry(TreeEntry::new(
                        EntryMode::Directory,
                        basename.to_string(),
                        child_oid,
                    ))?;
                }
            }

            tree_oids.insert(dir.clone(), tree.object_id()?);
            trees.push(tree);
        }

        let root_oid = tree_oids
            .remove("")
            .expect("root group always exists");

        Ok(BuiltTrees { root_oid, trees })
    }

    /// Flatten this tree (and, through `lookup`, its subtrees) into a
    /// `path -> entry` map
    pub fn flatten(
        &self,
        prefix: &str,
        lookup: &impl Fn(&ObjectId) -> anyhow::Result<Tree>,
        into: &mut BTreeMap<String, TreeEntry>,
    ) -> anyhow::Result<()> {
        for entry in self.entries() {
            let path = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", prefix, entry.name)
            };

            if entry.mode.is_tree() {
                let subtree = lookup(&entry.oid)?;
                subtree.flatten(&path, lookup, into)?;
            } else {
                into.insert(path, entry.clone());
            }
        }

        Ok(())
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut payload = Vec::new();

        for entry in self.entries() {
            write!(payload, "{} {}\0", entry.mode.as_str(), entry.name)?;
            entry.oid.write_raw_to(&mut payload)?;
        }

        frame(ObjectType::Tree, &payload)
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut tree = Tree::new();
        let mut reader = reader;

        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF, no more entries
            }
            if mode_bytes.pop() != Some(b' ') {
                anyhow::bail!(VesError::MalformedObject(
                    "unexpected EOF in tree entry mode".to_string()
                ));
            }

            let mode_str = std::str::from_utf8(&mode_bytes)
                .map_err(|_| VesError::MalformedObject("non-UTF-8 tree entry mode".to_string()))?;
            let mode = EntryMode::from_octal_str(mode_str)?;

            name_bytes.clear();
            let n = reader.read_until(b'\0', &mut name_bytes)?;
            if n == 0 || name_bytes.pop() != Some(b'\0') {
                anyhow::bail!(VesError::MalformedObject(
                    "unexpected EOF in tree entry name".to_string()
                ));
            }
            let name = std::str::from_utf8(&name_bytes)
                .map_err(|_| VesError::MalformedObject("non-UTF-8 tree entry name".to_string()))?
                .to_string();
            if name.contains('/') {
                anyhow::bail!(VesError::MalformedObject(format!(
                    "tree entry name contains a slash: {name}"
                )));
            }

            let oid = ObjectId::read_raw_from(&mut reader).map_err(|_| {
                VesError::MalformedObject("unexpected EOF in tree entry hash".to_string())
            })?;

            tree.add_entry(TreeEntry::new(mode, name, oid))?;
        }

        Ok(tree)
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.entries()
            .iter()
            .map(|entry| {
                format!(
                    "{:0>6} {} {}\t{}",
                    entry.mode.as_str(),
                    entry.object_type().as_str(),
                    entry.oid.as_ref(),
                    entry.name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}
