use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::{EntryFlags, IndexEntry};
use crate::error::VesError;
use std::path::{Path, PathBuf};

impl Repository {
    /// Stage files (or whole directories) for the next commit
    ///
    /// Each file is hashed and written as a blob, its stat captured, and
    /// any prior entry under the same name replaced. The index is
    /// persisted once at the end.
    pub fn add(&self, paths: &[String]) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let mut staged_files = Vec::new();

        for path in paths {
            let relative = self.workspace().relativize(Path::new(path), &cwd)?;
            let full_path = self.workspace().path().join(&relative);

            if full_path.is_dir() {
                staged_files.extend(self.workspace().list_files(Some(relative.as_path()))?);
            } else if self.workspace().file_exists(&relative) {
                staged_files.push(relative);
            } else {
                anyhow::bail!(VesError::InvalidPath(format!(
                    "pathspec {path} did not match any files"
                )));
            }
        }

        let mut index = self.load_index()?;

        for file in staged_files {
            index.add(self.stage_file(&file)?)?;
        }

        index.write_updates()
    }

    fn stage_file(&self, relative: &Path) -> anyhow::Result<IndexEntry> {
        let blob = self.workspace().parse_blob(relative)?;
        let oid = self.database().store(&blob)?;
        let metadata = self.workspace().stat_file(relative)?;

        Ok(IndexEntry::new(
            relative.to_string_lossy().into_owned(),
            oid,
            metadata,
            EntryFlags::default(),
        ))
    }
}
