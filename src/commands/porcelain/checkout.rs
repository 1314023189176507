use crate::areas::repository::Repository;
use crate::artifacts::checkout::checkout_tree;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::resolve::find_object;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// Materialize a commit or tree into an empty destination directory
    ///
    /// The token may name a commit (its tree is used), an annotated tag
    /// (followed to the commit), or a tree directly. HEAD and the index
    /// are left untouched.
    pub fn checkout(&self, token: &str, destination: &Path) -> anyhow::Result<()> {
        let tree_oid = find_object(self, token, Some(ObjectType::Tree), true)?;

        checkout_tree(self.database(), &tree_oid, destination)?;

        writeln!(
            self.writer(),
            "Checked out {token} into {}",
            destination.display()
        )?;

        Ok(())
    }
}
