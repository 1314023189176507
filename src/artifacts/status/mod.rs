//! Three-way status between HEAD, the index, and the working tree
//!
//! Produces three categorized lists:
//! - staged: the HEAD tree flattened to `path -> hash`, diffed against
//!   the index (added / modified / deleted)
//! - unstaged: the index diffed against the worktree, using the stat
//!   fast-path (mtime pair, size, mode) and rehashing only on mismatch
//! - untracked: worktree files neither staged nor ignored
//!
//! Status is read-only: it never rewrites the index or any other state.

pub mod file_change;

use crate::areas::refs::HeadState;
use crate::areas::repository::Repository;
use crate::artifacts::ignore::IgnoreStack;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::{Tree, TreeEntry};
use crate::artifacts::status::file_change::{IndexChange, WorkspaceChange};
use crate::error::VesError;
use derive_new::new;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Everything `status` reports, in stable (sorted) order
#[derive(Debug)]
pub struct StatusReport {
    /// Current branch, or the commit HEAD is detached at
    pub head: HeadState,
    /// HEAD -> index differences, keyed by path
    pub index_changes: BTreeMap<String, IndexChange>,
    /// index -> worktree differences, keyed by path
    pub workspace_changes: BTreeMap<String, WorkspaceChange>,
    /// Files present on disk but unknown to the index and not ignored
    pub untracked: BTreeSet<String>,
}

#[derive(new)]
pub struct Status<'r> {
    repository: &'r Repository,
}

impl<'r> Status<'r> {
    pub fn report(&self) -> anyhow::Result<StatusReport> {
        // the ignore stack takes its own pass over the index, so build it
        // before borrowing the index for the diff walks
        let ignores = IgnoreStack::load(self.repository)?;
        let head_tree = self.flatten_head_tree()?;

        let index = self.repository.load_index()?;

        let mut index_changes = BTreeMap::new();
        let mut workspace_changes = BTreeMap::new();

        for entry in index.entries() {
            // staged: compare hashes against the flattened HEAD tree
            match head_tree.get(&entry.name) {
                Some(head_entry) if head_entry.oid != entry.oid => {
                    index_changes.insert(entry.name.clone(), IndexChange::Modified);
                }
                Some(_) => {}
                None => {
                    index_changes.insert(entry.name.clone(), IndexChange::Added);
                }
            }

            // unstaged: stat fast-path, rehash only when the stat differs
            let path = Path::new(&entry.name);
            if !self.repository.workspace().file_exists(path) {
                workspace_changes.insert(entry.name.clone(), WorkspaceChange::Deleted);
            } else {
                let stat = self.repository.workspace().stat_file(path)?;
                if !entry.stat_match(&stat) {
                    let blob = self.repository.workspace().parse_blob(path)?;
                    if blob.object_id()? != entry.oid {
                        workspace_changes.insert(entry.name.clone(), WorkspaceChange::Modified);
                    }
                }
            }
        }

        // paths in HEAD that the index no longer carries
        for path in head_tree.keys() {
            if index.entry_by_path(path).is_none() {
                index_changes.insert(path.clone(), IndexChange::Deleted);
            }
        }

        // untracked: everything on disk the index does not reference,
        // minus what the ignore rules exclude
        let mut untracked = BTreeSet::new();
        for file in self.repository.workspace().list_files(None)? {
            let name = file.to_string_lossy().into_owned();
            if index.entry_by_path(&name).is_some() {
                continue;
            }
            if ignores.check(&name)? {
                continue;
            }
            untracked.insert(name);
        }

        Ok(StatusReport {
            head: self.repository.refs().head_state()?,
            index_changes,
            workspace_changes,
            untracked,
        })
    }

    /// Flatten the HEAD commit's tree to `path -> entry`; empty when no
    /// commit exists yet
    fn flatten_head_tree(&self) -> anyhow::Result<BTreeMap<String, TreeEntry>> {
        let mut head_tree = BTreeMap::new();

        let head_oid = match self.repository.refs().read_head()? {
            Some(oid) => oid,
            None => return Ok(head_tree),
        };

        let commit = self
            .repository
            .database()
            .parse_object_as_commit(&head_oid)?
            .ok_or_else(|| VesError::ObjectNotFound(format!("HEAD commit {head_oid}")))?;

        let tree = self.load_tree(&commit.tree_oid()?)?;
        let database = self.repository.database();
        tree.flatten(
            "",
            &|oid: &ObjectId| {
                database
                    .parse_object_as_tree(oid)?
                    .ok_or_else(|| VesError::ObjectNotFound(format!("tree {oid}")).into())
            },
            &mut head_tree,
        )?;

        Ok(head_tree)
    }

    fn load_tree(&self, oid: &ObjectId) -> anyhow::Result<Tree> {
        self.repository
            .database()
            .parse_object_as_tree(oid)?
            .ok_or_else(|| VesError::ObjectNotFound(format!("tree {oid}")).into())
    }
}
