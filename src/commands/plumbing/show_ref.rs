use crate::areas::refs::RefNode;
use crate::areas::repository::Repository;
use std::collections::BTreeMap;
use std::io::Write;

impl Repository {
    /// List every reference under `refs/` with its resolved hash
    pub fn show_ref(&self) -> anyhow::Result<()> {
        let listing = self.refs().list()?;
        self.print_ref_nodes(&listing, "refs")
    }

    fn print_ref_nodes(
        &self,
        nodes: &BTreeMap<String, RefNode>,
        prefix: &str,
    ) -> anyhow::Result<()> {
        for (name, node) in nodes {
            let path = format!("{prefix}/{name}");
            match node {
                RefNode::Dir(children) => self.print_ref_nodes(children, &path)?,
                RefNode::Leaf(Some(oid)) => writeln!(self.writer(), "{oid} {path}")?,
                RefNode::Leaf(None) => writeln!(self.writer(), "{path}")?,
            }
        }

        Ok(())
    }
}
