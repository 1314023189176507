use crate::error::VesError;
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectType {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
            ObjectType::Tag => "tag",
        }
    }

    /// Parse the framed header `{type} {size}\0`, consuming it from the reader
    ///
    /// Returns the object type together with the declared payload size so the
    /// caller can verify it against the actual payload length.
    pub fn parse_header(reader: &mut impl BufRead) -> anyhow::Result<(ObjectType, usize)> {
        let mut type_bytes = Vec::new();
        reader.read_until(b' ', &mut type_bytes)?;
        if type_bytes.pop() != Some(b' ') {
            anyhow::bail!(VesError::MalformedObject(
                "missing space separator in header".to_string()
            ));
        }

        let object_type = std::str::from_utf8(&type_bytes)
            .map_err(|_| VesError::MalformedObject("non-UTF-8 type tag".to_string()))?;
        let object_type = ObjectType::try_from(object_type)?;

        let mut size_bytes = Vec::new();
        reader.read_until(b'\0', &mut size_bytes)?;
        if size_bytes.pop() != Some(b'\0') {
            anyhow::bail!(VesError::MalformedObject(
                "missing NUL separator in header".to_string()
            ));
        }

        let size = std::str::from_utf8(&size_bytes)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| VesError::MalformedObject("invalid size in header".to_string()))?;

        Ok((object_type, size))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            "tag" => Ok(ObjectType::Tag),
            _ => Err(VesError::MalformedObject(format!("unknown object type {value}")).into()),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
