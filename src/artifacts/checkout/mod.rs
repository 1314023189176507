//! Tree materialization
//!
//! Writes the contents of a tree object into a destination directory:
//! blobs become files with their recorded mode, subtrees become
//! directories, symlink entries become symlinks pointing at the blob's
//! content. The destination must be empty or nonexistent; HEAD and the
//! index are never touched here.

use crate::areas::database::Database;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::error::VesError;
use anyhow::Context;
use std::path::Path;
use tracing::debug;

/// Materialize `tree_oid` into `destination`
pub fn checkout_tree(
    database: &Database,
    tree_oid: &ObjectId,
    destination: &Path,
) -> anyhow::Result<()> {
    if destination.exists() {
        if !destination.is_dir() {
            anyhow::bail!(VesError::InvalidPath(format!(
                "{} is not a directory",
                destination.display()
            )));
        }
        if destination.read_dir()?.next().is_some() {
            anyhow::bail!(VesError::DestinationNotEmpty(destination.to_path_buf()));
        }
    } else {
        std::fs::create_dir_all(destination)
            .with_context(|| format!("failed to create {}", destination.display()))?;
    }

    debug!(tree = %tree_oid, destination = %destination.display(), "checking out tree");
    materialize(database, tree_oid, destination)
}

fn materialize(database: &Database, tree_oid: &ObjectId, destination: &Path) -> anyhow::Result<()> {
    let tree = database
        .parse_object_as_tree(tree_oid)?
        .ok_or_else(|| VesError::ObjectNotFound(format!("tree {tree_oid}")))?;

    for entry in tree.entries() {
        let target = destination.join(&entry.name);

        match entry.mode {
            EntryMode::Directory => {
                std::fs::create_dir(&target)
                    .with_context(|| format!("failed to create {}", target.display()))?;
                materialize(database, &entry.oid, &target)?;
            }
            EntryMode::Symlink => {
                let blob = database
                    .parse_object_as_blob(&entry.oid)?
                    .ok_or_else(|| VesError::ObjectNotFound(format!("blob {}", entry.oid)))?;
                let link_target = String::from_utf8_lossy(blob.content()).into_owned();
                std::os::unix::fs::symlink(&link_target, &target)
                    .with_context(|| format!("failed to create symlink {}", target.display()))?;
            }
            EntryMode::Regular | EntryMode::Executable => {
                let blob = database
                    .parse_object_as_blob(&entry.oid)?
                    .ok_or_else(|| VesError::ObjectNotFound(format!("blob {}", entry.oid)))?;
                std::fs::write(&target, blob.content())
                    .with_context(|| format!("failed to write {}", target.display()))?;

                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let mode = if entry.mode == EntryMode::Executable {
                        0o755
                    } else {
                        0o644
                    };
                    std::fs::set_permissions(&target, std::fs::Permissions::from_mode(mode))
                        .with_context(|| {
                            format!("failed to set permissions on {}", target.display())
                        })?;
                }
            }
            EntryMode::Gitlink => {
                // gitlinks reference another repository's commit; there is
                // nothing to materialize locally
                std::fs::create_dir(&target)
                    .with_context(|| format!("failed to create {}", target.display()))?;
            }
        }
    }

    Ok(())
}
