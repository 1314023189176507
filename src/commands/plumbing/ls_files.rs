use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    /// List staged paths, with full stat detail when `verbose`
    pub fn ls_files(&self, verbose: bool) -> anyhow::Result<()> {
        let index = self.load_index()?;

        if verbose {
            writeln!(
                self.writer(),
                "index file holding {} entries",
                index.len()
            )?;
        }

        for entry in index.entries() {
            writeln!(self.writer(), "{}", entry.name)?;
            if verbose {
                writeln!(
                    self.writer(),
                    "  {} with blob {}",
                    entry.metadata.mode,
                    entry.oid
                )?;
                writeln!(
                    self.writer(),
                    "  created {}.{}, modified {}.{}",
                    entry.metadata.ctime,
                    entry.metadata.ctime_nsec,
                    entry.metadata.mtime,
                    entry.metadata.mtime_nsec
                )?;
                writeln!(
                    self.writer(),
                    "  device {}, inode {}",
                    entry.metadata.dev,
                    entry.metadata.ino
                )?;
                writeln!(
                    self.writer(),
                    "  user {} group {}",
                    entry.metadata.uid,
                    entry.metadata.gid
                )?;
                writeln!(
                    self.writer(),
                    "  flags: stage={} assume_valid={}",
                    entry.flags.stage,
                    entry.flags.assume_valid
                )?;
            }
        }

        Ok(())
    }
}
