//! File modes carried by index entries and tree entries
//!
//! The index stores a mode as a 4-bit object type (regular = 0b1000,
//! symlink = 0b1010, gitlink = 0b1110) plus 9 permission bits; regular files
//! accept only 0644 or 0755, the other types use 0. Trees additionally use
//! `40000` for subtree entries.

use crate::error::VesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum EntryMode {
    #[default]
    Regular,
    Executable,
    Symlink,
    Gitlink,
    Directory,
}

/// Object type nibble for regular files
const TYPE_REGULAR: u32 = 0b1000;
/// Object type nibble for symbolic links
const TYPE_SYMLINK: u32 = 0b1010;
/// Object type nibble for gitlinks (commit entries in trees)
const TYPE_GITLINK: u32 = 0b1110;

impl EntryMode {
    /// Octal string as written into tree entries, without leading zeros
    pub fn as_str(&self) -> &str {
        match self {
            EntryMode::Regular => "100644",
            EntryMode::Executable => "100755",
            EntryMode::Symlink => "120000",
            EntryMode::Gitlink => "160000",
            EntryMode::Directory => "40000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::Regular => 0o100644,
            EntryMode::Executable => 0o100755,
            EntryMode::Symlink => 0o120000,
            EntryMode::Gitlink => 0o160000,
            EntryMode::Directory => 0o40000,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }

    /// Parse an on-disk tree entry mode, tolerating a leading zero
    pub fn from_octal_str(mode: &str) -> anyhow::Result<Self> {
        match mode.trim_start_matches('0') {
            "" => Err(VesError::MalformedObject("empty entry mode".to_string()).into()),
            "100644" => Ok(EntryMode::Regular),
            "100755" => Ok(EntryMode::Executable),
            "120000" => Ok(EntryMode::Symlink),
            "160000" => Ok(EntryMode::Gitlink),
            "40000" => Ok(EntryMode::Directory),
            other => {
                Err(VesError::MalformedObject(format!("invalid entry mode {other}")).into())
            }
        }
    }
}

impl TryFrom<u32> for EntryMode {
    type Error = anyhow::Error;

    /// Validate an index-file mode word: a known type nibble plus the
    /// permission bits that type allows
    fn try_from(mode: u32) -> anyhow::Result<Self> {
        let mode_type = mode >> 12;
        let perms = mode & 0o777;

        match (mode_type, perms) {
            (TYPE_REGULAR, 0o644) => Ok(EntryMode::Regular),
            (TYPE_REGULAR, 0o755) => Ok(EntryMode::Executable),
            (TYPE_SYMLINK, 0) => Ok(EntryMode::Symlink),
            (TYPE_GITLINK, 0) => Ok(EntryMode::Gitlink),
            _ => Err(VesError::MalformedIndex(format!("invalid entry mode {mode:o}")).into()),
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0o100644, EntryMode::Regular)]
    #[case(0o100755, EntryMode::Executable)]
    #[case(0o120000, EntryMode::Symlink)]
    #[case(0o160000, EntryMode::Gitlink)]
    fn index_modes_round_trip(#[case] raw: u32, #[case] expected: EntryMode) {
        let mode = EntryMode::try_from(raw).unwrap();
        assert_eq!(mode, expected);
        assert_eq!(mode.as_u32(), raw);
    }

    #[rstest]
    #[case(0o100600)]
    #[case(0o120644)]
    #[case(0o040000)]
    fn invalid_index_modes_are_rejected(#[case] raw: u32) {
        assert!(EntryMode::try_from(raw).is_err());
    }

    #[test]
    fn tree_modes_accept_leading_zero() {
        assert_eq!(
            EntryMode::from_octal_str("040000").unwrap(),
            EntryMode::Directory
        );
        assert_eq!(
            EntryMode::from_octal_str("40000").unwrap(),
            EntryMode::Directory
        );
    }

    #[test]
    fn directory_mode_serializes_without_leading_zero() {
        assert_eq!(EntryMode::Directory.as_str(), "40000");
    }
}
