use crate::areas::repository::Repository;
use crate::error::VesError;
use anyhow::Context;
use std::path::Path;

impl Repository {
    /// Remove paths from the index, deleting the worktree files unless
    /// `cached`
    pub fn rm(&self, paths: &[String], cached: bool) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let mut index = self.load_index()?;

        for path in paths {
            let relative = self.workspace().relativize(Path::new(path), &cwd)?;
            let name = relative.to_string_lossy().into_owned();

            if !index.is_directly_tracked(&name) {
                anyhow::bail!(VesError::InvalidPath(format!(
                    "{path} is not in the index"
                )));
            }

            index.remove(&name);

            if !cached {
                let full_path = self.workspace().path().join(&relative);
                if full_path.is_dir() {
                    std::fs::remove_dir_all(&full_path)
                        .with_context(|| format!("failed to remove {}", full_path.display()))?;
                } else if self.workspace().file_exists(&relative) {
                    std::fs::remove_file(&full_path)
                        .with_context(|| format!("failed to remove {}", full_path.display()))?;
                }
            }
        }

        index.write_updates()
    }
}
