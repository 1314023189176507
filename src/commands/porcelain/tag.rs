use crate::areas::refs::RefNode;
use crate::areas::repository::Repository;
use crate::artifacts::config::resolve_identity;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::resolve::find_object;
use std::collections::BTreeMap;
use std::io::Write;

impl Repository {
    /// Create a tag, or list existing tags when no name is given
    ///
    /// A lightweight tag is just a ref pointing at the target; `annotate`
    /// writes a full tag object carrying the tagger identity and message.
    pub fn tag(
        &self,
        name: Option<&str>,
        target: &str,
        annotate: bool,
        message: Option<&str>,
    ) -> anyhow::Result<()> {
        let name = match name {
            Some(name) => name,
            None => return self.list_tags(),
        };

        let target_oid = find_object(self, target, None, true)?;

        if annotate {
            let tagger = resolve_identity()?;
            let target_type = self.database().object_type(&target_oid)?;
            let message = format!("{}\n", message.unwrap_or(name).trim());

            let tag = Tag::new(&target_oid, target_type, name, &tagger, &message);
            let tag_oid = self.database().store(&tag)?;
            self.refs().create_ref(&format!("refs/tags/{name}"), &tag_oid)?;
        } else {
            self.refs()
                .create_ref(&format!("refs/tags/{name}"), &target_oid)?;
        }

        Ok(())
    }

    fn list_tags(&self) -> anyhow::Result<()> {
        let listing = self.refs().list()?;
        if let Some(RefNode::Dir(tags)) = listing.get("tags") {
            self.print_tag_names(tags, "")?;
        }

        Ok(())
    }

    fn print_tag_names(
        &self,
        nodes: &BTreeMap<String, RefNode>,
        prefix: &str,
    ) -> anyhow::Result<()> {
        for (name, node) in nodes {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };
            match node {
                RefNode::Dir(children) => self.print_tag_names(children, &path)?,
                RefNode::Leaf(_) => writeln!(self.writer(), "{path}")?,
            }
        }

        Ok(())
    }
}
