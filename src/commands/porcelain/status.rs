use crate::areas::refs::HeadState;
use crate::areas::repository::Repository;
use crate::artifacts::status::{Status, StatusReport};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

impl Repository {
    /// Show the working tree status
    pub fn status(&self, porcelain: bool) -> anyhow::Result<()> {
        let report = Status::new(self).report()?;

        if porcelain {
            self.print_porcelain_status(&report)
        } else {
            self.print_long_status(&report)
        }
    }

    fn print_porcelain_status(&self, report: &StatusReport) -> anyhow::Result<()> {
        let mut paths: BTreeSet<&String> = BTreeSet::new();
        paths.extend(report.index_changes.keys());
        paths.extend(report.workspace_changes.keys());

        for path in paths {
            let staged = report
                .index_changes
                .get(path)
                .map(|change| change.code())
                .unwrap_or(' ');
            let unstaged = report
                .workspace_changes
                .get(path)
                .map(|change| change.code())
                .unwrap_or(' ');
            writeln!(self.writer(), "{staged}{unstaged} {path}")?;
        }

        for path in self.fold_untracked(&report.untracked)? {
            writeln!(self.writer(), "?? {path}")?;
        }

        Ok(())
    }

    fn print_long_status(&self, report: &StatusReport) -> anyhow::Result<()> {
        match &report.head {
            HeadState::Branch { name, .. } => {
                writeln!(self.writer(), "On branch {name}")?;
            }
            HeadState::Detached(oid) => {
                writeln!(self.writer(), "HEAD detached at {}", oid.to_short_oid())?;
            }
        }

        if !report.index_changes.is_empty() {
            writeln!(self.writer(), "\nChanges to be committed:")?;
            for (path, change) in &report.index_changes {
                writeln!(self.writer(), "{}{path}", change.label())?;
            }
        }

        if !report.workspace_changes.is_empty() {
            writeln!(self.writer(), "\nChanges not staged for commit:")?;
            for (path, change) in &report.workspace_changes {
                writeln!(self.writer(), "{}{path}", change.label())?;
            }
        }

        let untracked = self.fold_untracked(&report.untracked)?;
        if !untracked.is_empty() {
            writeln!(self.writer(), "\nUntracked files:")?;
            for path in untracked {
                writeln!(self.writer(), "        {path}")?;
            }
        }

        Ok(())
    }

    /// Collapse a fully-untracked top-level directory into `dir/`
    ///
    /// A directory folds only when every file on disk beneath it is in the
    /// untracked set; a single tracked or ignored file keeps the individual
    /// listing.
    fn fold_untracked(&self, untracked: &BTreeSet<String>) -> anyhow::Result<Vec<String>> {
        let mut shown = Vec::new();
        let mut by_dir: BTreeMap<&str, Vec<&String>> = BTreeMap::new();

        for path in untracked {
            match path.split_once('/') {
                None => shown.push(path.clone()),
                Some((dir, _)) => by_dir.entry(dir).or_default().push(path),
            }
        }

        for (dir, files) in by_dir {
            let on_disk = self.workspace().list_files(Some(Path::new(dir)))?;
            let fully_untracked = on_disk
                .iter()
                .all(|file| untracked.contains(&file.to_string_lossy().into_owned()));

            if fully_untracked {
                shown.push(format!("{dir}/"));
            } else {
                shown.extend(files.into_iter().cloned());
            }
        }

        shown.sort();
        Ok(shown)
    }
}
