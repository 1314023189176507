use crate::areas::repository::Repository;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::resolve::find_object;
use std::io::Write;

impl Repository {
    /// Print the payload of the object a token resolves to
    ///
    /// Blobs are written raw; trees and the KVLM objects print their
    /// textual rendition.
    pub fn cat_file(&self, token: &str, expected: Option<ObjectType>) -> anyhow::Result<()> {
        let oid = find_object(self, token, expected, true)?;
        let object = self.database().parse_object(&oid)?;

        match object {
            ObjectBox::Blob(blob) => self.writer().write_all(blob.content())?,
            other => writeln!(self.writer(), "{}", other.display())?,
        }

        Ok(())
    }
}
