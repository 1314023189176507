//! Working directory operations
//!
//! The workspace reads files and stat metadata from the worktree, always
//! excluding the repository metadata directory. Paths handed out are
//! relative to the worktree root.

use crate::artifacts::index::index_entry::EntryMetadata;
use crate::artifacts::objects::blob::Blob;
use anyhow::Context;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the repository metadata directory
pub const VES_DIR: &str = ".ves";

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a worktree file as a blob
    ///
    /// Symlinks hash their target path, not the contents of the file they
    /// point at.
    pub fn parse_blob(&self, relative: &Path) -> anyhow::Result<Blob> {
        Ok(Blob::new(self.read_file(relative)?))
    }

    /// Raw content of a worktree file (the link target for symlinks)
    pub fn read_file(&self, relative: &Path) -> anyhow::Result<Bytes> {
        let full_path = self.path.join(relative);
        let metadata = std::fs::symlink_metadata(&full_path)
            .with_context(|| format!("failed to stat {}", full_path.display()))?;

        if metadata.file_type().is_symlink() {
            let target = std::fs::read_link(&full_path)
                .with_context(|| format!("failed to read link {}", full_path.display()))?;
            Ok(Bytes::from(target.as_os_str().to_string_lossy().into_owned().into_bytes()))
        } else {
            let content = std::fs::read(&full_path)
                .with_context(|| format!("failed to read {}", full_path.display()))?;
            Ok(Bytes::from(content))
        }
    }

    /// Stat a worktree file without following symlinks
    pub fn stat_file(&self, relative: &Path) -> anyhow::Result<EntryMetadata> {
        let full_path = self.path.join(relative);
        let metadata = std::fs::symlink_metadata(&full_path)
            .with_context(|| format!("failed to stat {}", full_path.display()))?;

        (full_path.as_path(), &metadata).try_into()
    }

    pub fn file_exists(&self, relative: &Path) -> bool {
        let full_path = self.path.join(relative);
        std::fs::symlink_metadata(full_path).is_ok()
    }

    /// All files under the worktree (or under `root` within it), relative
    /// paths, metadata directory excluded, symlinks included as leaves
    pub fn list_files(&self, root: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
        let root = match root {
            Some(path) => self.path.join(path),
            None => self.path.to_path_buf(),
        };

        if !root.exists() {
            anyhow::bail!("path does not exist: {}", root.display());
        }

        if root.is_file() || root.is_symlink() {
            let relative = root
                .strip_prefix(self.path.as_ref())
                .map(PathBuf::from)
                .unwrap_or_default();
            return Ok(vec![relative]);
        }

        Ok(WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != VES_DIR)
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() || entry.file_type().is_symlink())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(self.path.as_ref())
                    .ok()
                    .map(PathBuf::from)
            })
            .collect())
    }

    /// Turn a user-supplied path (absolute or relative to `cwd`) into a
    /// worktree-relative path, rejecting escapes
    pub fn relativize(&self, path: &Path, cwd: &Path) -> anyhow::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };

        let normalized = normalize(&absolute);
        normalized
            .strip_prefix(self.path.as_ref())
            .map(PathBuf::from)
            .map_err(|_| {
                crate::error::VesError::InvalidPath(format!(
                    "{} is outside the worktree",
                    path.display()
                ))
                .into()
            })
    }
}

/// Collapse `.` and `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
