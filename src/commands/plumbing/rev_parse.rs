use crate::areas::repository::Repository;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::resolve::find_object;
use std::io::Write;

impl Repository {
    /// Resolve a token to a full object id, optionally following to an
    /// expected type
    pub fn rev_parse(&self, token: &str, expected: Option<ObjectType>) -> anyhow::Result<()> {
        let oid = find_object(self, token, expected, true)?;
        writeln!(self.writer(), "{oid}")?;

        Ok(())
    }
}
