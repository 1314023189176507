use crate::areas::repository::Repository;
use crate::artifacts::ignore::IgnoreStack;
use std::io::Write;

impl Repository {
    /// Print each path that the ignore rules exclude
    pub fn check_ignore(&self, paths: &[String]) -> anyhow::Result<()> {
        let ignores = IgnoreStack::load(self)?;

        for path in paths {
            if ignores.check(path)? {
                writeln!(self.writer(), "{path}")?;
            }
        }

        Ok(())
    }
}
