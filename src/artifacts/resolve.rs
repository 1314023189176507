//! Object name resolution
//!
//! Maps a user token (`HEAD`, a 4-40 hex prefix, a tag, branch, or remote
//! name) to candidate object hashes, and optionally follows a resolved
//! object down to an expected type (tag -> its target, commit -> its tree).

use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::error::VesError;

/// Shortest hex prefix accepted as an abbreviated object id
const MIN_PREFIX_LENGTH: usize = 4;

/// All candidate hashes a token may refer to
///
/// The caller decides how to treat multiple candidates; `find_object`
/// turns them into the ambiguity error.
pub fn resolve_name(repository: &Repository, token: &str) -> anyhow::Result<Vec<ObjectId>> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(Vec::new());
    }

    if token == "HEAD" {
        return Ok(repository.refs().read_head()?.into_iter().collect());
    }

    let mut candidates = Vec::new();

    if looks_like_hash(token) {
        let prefix = token.to_ascii_lowercase();
        candidates.extend(repository.database().find_objects_by_prefix(&prefix)?);
    }

    for namespace in ["refs/tags", "refs/heads", "refs/remotes"] {
        if let Some(oid) = repository.refs().resolve(&format!("{namespace}/{token}"))? {
            candidates.push(oid);
        }
    }

    Ok(candidates)
}

/// Resolve a token to exactly one object, optionally following it to an
/// expected type
///
/// The follow loop reads only the object header until a redirect is needed:
/// a tag redirects to its `object` field, a commit redirects to its `tree`
/// when a tree is wanted. Any other mismatch is the type-mismatch error.
pub fn find_object(
    repository: &Repository,
    token: &str,
    expected: Option<ObjectType>,
    follow: bool,
) -> anyhow::Result<ObjectId> {
    let candidates = resolve_name(repository, token)?;

    let mut oid = match candidates.as_slice() {
        [] => anyhow::bail!(VesError::ObjectNotFound(token.to_string())),
        [single] => single.clone(),
        several => anyhow::bail!(VesError::AmbiguousObject {
            name: token.to_string(),
            candidates: several.iter().map(|oid| oid.to_string()).collect(),
        }),
    };

    let expected = match expected {
        Some(expected) => expected,
        None => return Ok(oid),
    };

    loop {
        let actual = repository.database().object_type(&oid)?;

        if actual == expected {
            return Ok(oid);
        }
        if !follow {
            anyhow::bail!(type_mismatch(&oid, expected, actual));
        }

        match (actual, expected) {
            (ObjectType::Tag, _) => {
                let tag = repository
                    .database()
                    .parse_object_as_tag(&oid)?
                    .ok_or_else(|| type_mismatch(&oid, ObjectType::Tag, actual))?;
                oid = tag.target()?;
            }
            (ObjectType::Commit, ObjectType::Tree) => {
                let commit = repository
                    .database()
                    .parse_object_as_commit(&oid)?
                    .ok_or_else(|| type_mismatch(&oid, ObjectType::Commit, actual))?;
                oid = commit.tree_oid()?;
            }
            _ => anyhow::bail!(type_mismatch(&oid, expected, actual)),
        }
    }
}

fn type_mismatch(oid: &ObjectId, expected: ObjectType, actual: ObjectType) -> anyhow::Error {
    VesError::TypeMismatch {
        oid: oid.to_string(),
        expected: expected.as_str().to_string(),
        actual: actual.as_str().to_string(),
    }
    .into()
}

/// 4-40 hex characters
fn looks_like_hash(token: &str) -> bool {
    (MIN_PREFIX_LENGTH..=40).contains(&token.len())
        && token.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hash_shapes_are_recognized() {
        assert!(looks_like_hash("abcd"));
        assert!(looks_like_hash("AbCd12"));
        assert!(looks_like_hash(&"a".repeat(40)));
        assert!(!looks_like_hash("abc"));
        assert!(!looks_like_hash(&"a".repeat(41)));
        assert!(!looks_like_hash("ghij"));
    }

    #[test]
    fn hash_check_is_length_bounded() {
        for len in [4, 20, 40] {
            assert!(looks_like_hash(&"f".repeat(len)));
        }
        for len in [0, 1, 3, 41, 64] {
            assert!(!looks_like_hash(&"f".repeat(len)));
        }
        assert_eq!(looks_like_hash("deadbeef"), true);
    }
}
