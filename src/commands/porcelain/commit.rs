use crate::areas::repository::Repository;
use crate::artifacts::config::resolve_identity;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use std::io::Write;

impl Repository {
    /// Snapshot the index as a commit on the current ref
    ///
    /// Builds the tree hierarchy from the staging list, composes the commit
    /// with the resolved identity, and advances the branch HEAD points at
    /// (or HEAD itself when detached). The first commit on a branch creates
    /// its ref file.
    pub fn commit(&self, message: &str) -> anyhow::Result<()> {
        let identity = resolve_identity()?;

        let index = self.load_index()?;
        let built = Tree::build_from_index(index.entries())?;
        drop(index);

        for tree in &built.trees {
            self.database().store(tree)?;
        }

        let parents: Vec<ObjectId> = self.refs().read_head()?.into_iter().collect();
        let root_marker = if parents.is_empty() {
            "(root-commit) "
        } else {
            ""
        };

        let message = format!("{}\n", message.trim());
        let commit = Commit::new(&built.root_oid, &parents, &identity, &identity, &message);
        let commit_oid = self.database().store(&commit)?;

        self.refs().update_current(&commit_oid)?;

        writeln!(
            self.writer(),
            "[{root_marker}{commit_oid}] {}",
            commit.short_message()
        )?;

        Ok(())
    }
}
