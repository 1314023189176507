use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::resolve::find_object;
use crate::error::VesError;
use std::io::Write;

impl Repository {
    /// List a tree's entries, optionally descending into subtrees
    pub fn ls_tree(&self, token: &str, recursive: bool) -> anyhow::Result<()> {
        let tree_oid = find_object(self, token, Some(ObjectType::Tree), true)?;
        self.print_tree(&tree_oid, "", recursive)
    }

    fn print_tree(&self, tree_oid: &ObjectId, prefix: &str, recursive: bool) -> anyhow::Result<()> {
        let tree = self
            .database()
            .parse_object_as_tree(tree_oid)?
            .ok_or_else(|| VesError::ObjectNotFound(format!("tree {tree_oid}")))?;

        for entry in tree.entries() {
            let path = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{prefix}/{}", entry.name)
            };

            if recursive && entry.mode.is_tree() {
                self.print_tree(&entry.oid, &path, true)?;
            } else {
                writeln!(
                    self.writer(),
                    "{:0>6} {} {}\t{}",
                    entry.mode.as_str(),
                    entry.object_type().as_str(),
                    entry.oid.as_ref(),
                    path
                )?;
            }
        }

        Ok(())
    }
}
