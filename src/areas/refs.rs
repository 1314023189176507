//! Reference namespace (HEAD, branches, tags)
//!
//! A reference file holds either a 40-hex hash followed by LF (direct) or
//! `ref: {path}\n` (symbolic). `HEAD` sits at the top of the metadata
//! directory; every other ref lives under `refs/`. Symbolic chains are
//! followed with a bounded loop so cycles surface as an error instead of
//! hanging.

use crate::artifacts::objects::object_id::ObjectId;
use crate::error::VesError;
use anyhow::Context;
use derive_new::new;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Prefix marking a symbolic reference
const SYMREF_PREFIX: &str = "ref: ";

/// Longest symbolic chain followed before declaring a cycle
const MAX_SYMREF_DEPTH: usize = 10;

/// Where HEAD currently points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    /// HEAD is symbolic to a branch; `oid` is absent while the branch is
    /// still unborn (no commit yet)
    Branch {
        name: String,
        oid: Option<ObjectId>,
    },
    /// HEAD holds a commit hash directly
    Detached(ObjectId),
}

/// A node in the nested listing of `refs/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefNode {
    /// Leaf file, resolved to its ultimate hash (absent if unresolvable)
    Leaf(Option<ObjectId>),
    /// Subdirectory, keys in lexicographic order
    Dir(BTreeMap<String, RefNode>),
}

/// Reference store rooted at the repository metadata directory
#[derive(Debug, new)]
pub struct Refs {
    /// Path to the metadata directory (`.ves`)
    path: Box<Path>,
}

impl Refs {
    /// Resolve a reference name to its ultimate hash
    ///
    /// Returns `None` when the file does not exist. Symbolic links are
    /// followed up to `MAX_SYMREF_DEPTH` hops; exceeding that is the
    /// reference-cycle error.
    pub fn resolve(&self, name: &str) -> anyhow::Result<Option<ObjectId>> {
        let mut current = name.to_string();

        for _ in 0..MAX_SYMREF_DEPTH {
            let ref_path = self.path.join(&current);
            if !ref_path.is_file() {
                return Ok(None);
            }

            let raw = std::fs::read_to_string(&ref_path)
                .with_context(|| format!("failed to read ref file {}", ref_path.display()))?;
            let content = raw.strip_suffix('\n').unwrap_or(&raw);

            match content.strip_prefix(SYMREF_PREFIX) {
                Some(target) => current = target.to_string(),
                None => return Ok(Some(ObjectId::try_parse(content.to_string())?)),
            }
        }

        anyhow::bail!(VesError::ReferenceCycle(name.to_string()))
    }

    /// The hash HEAD ultimately points at, if any commit exists yet
    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.resolve(HEAD_REF_NAME)
    }

    /// One-level read of HEAD's symbolic target, `None` when detached
    pub fn head_target(&self) -> anyhow::Result<Option<String>> {
        let head_path = self.path.join(HEAD_REF_NAME);
        if !head_path.is_file() {
            anyhow::bail!("HEAD is missing at {}", head_path.display());
        }

        let raw = std::fs::read_to_string(&head_path)
            .with_context(|| format!("failed to read {}", head_path.display()))?;
        let content = raw.strip_suffix('\n').unwrap_or(&raw);

        Ok(content
            .strip_prefix(SYMREF_PREFIX)
            .map(|target| target.to_string()))
    }

    /// Current branch name (or detached commit) for status display
    pub fn head_state(&self) -> anyhow::Result<HeadState> {
        match self.head_target()? {
            Some(target) => {
                let name = target
                    .strip_prefix("refs/heads/")
                    .unwrap_or(target.as_str())
                    .to_string();
                let oid = self.resolve(HEAD_REF_NAME)?;
                Ok(HeadState::Branch { name, oid })
            }
            None => {
                let oid = self.read_head()?.ok_or_else(|| {
                    VesError::ObjectNotFound("HEAD does not resolve to a commit".to_string())
                })?;
                Ok(HeadState::Detached(oid))
            }
        }
    }

    /// Record a new commit on the current ref
    ///
    /// When HEAD is symbolic the target branch file is written (created on
    /// the first commit); when HEAD is detached HEAD itself is rewritten.
    pub fn update_current(&self, oid: &ObjectId) -> anyhow::Result<()> {
        match self.head_target()? {
            Some(target) => self.create_ref(&target, oid),
            None => self.create_ref(HEAD_REF_NAME, oid),
        }
    }

    /// Write a direct reference (`{hex}\n`), atomically
    pub fn create_ref(&self, name: &str, oid: &ObjectId) -> anyhow::Result<()> {
        debug!(name, oid = %oid, "updating ref");
        self.write_ref_file(name, &format!("{}\n", oid.as_ref()))
    }

    /// Write a symbolic reference (`ref: {target}\n`), atomically
    pub fn create_symref(&self, name: &str, target: &str) -> anyhow::Result<()> {
        debug!(name, target, "updating symref");
        self.write_ref_file(name, &format!("{SYMREF_PREFIX}{target}\n"))
    }

    pub fn ref_exists(&self, name: &str) -> bool {
        self.path.join(name).is_file()
    }

    /// Nested listing of everything under `refs/`, leaves resolved
    pub fn list(&self) -> anyhow::Result<BTreeMap<String, RefNode>> {
        self.list_dir(&self.path.join("refs"))
    }

    fn list_dir(&self, dir: &Path) -> anyhow::Result<BTreeMap<String, RefNode>> {
        let mut nodes = BTreeMap::new();

        if !dir.is_dir() {
            return Ok(nodes);
        }

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();

            if path.is_dir() {
                nodes.insert(name, RefNode::Dir(self.list_dir(&path)?));
            } else {
                let relative = path
                    .strip_prefix(self.path.as_ref())
                    .with_context(|| format!("ref outside metadata dir: {}", path.display()))?;
                let resolved = self.resolve(&relative.to_string_lossy())?;
                nodes.insert(name, RefNode::Leaf(resolved));
            }
        }

        Ok(nodes)
    }

    fn write_ref_file(&self, name: &str, content: &str) -> anyhow::Result<()> {
        let ref_path = self.path.join(name);
        let parent = ref_path
            .parent()
            .with_context(|| format!("invalid ref path {}", ref_path.display()))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create ref directory {}", parent.display()))?;

        // write-to-temp then rename keeps the update atomic
        let temp_path = parent.join(format!("tmp-ref-{}", rand::random::<u32>()));
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .with_context(|| format!("failed to open temp ref {}", temp_path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("failed to write temp ref {}", temp_path.display()))?;

        std::fs::rename(&temp_path, &ref_path)
            .with_context(|| format!("failed to rename ref into {}", ref_path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn oid(hex: &str) -> ObjectId {
        ObjectId::try_parse(hex.to_string()).unwrap()
    }

    fn setup() -> (assert_fs::TempDir, Refs) {
        let dir = assert_fs::TempDir::new().unwrap();
        let ves_dir = dir.path().join(".ves");
        std::fs::create_dir_all(ves_dir.join("refs").join("heads")).unwrap();
        std::fs::create_dir_all(ves_dir.join("refs").join("tags")).unwrap();
        let refs = Refs::new(ves_dir.into_boxed_path());
        (dir, refs)
    }

    #[test]
    fn missing_ref_resolves_to_absent() {
        let (_dir, refs) = setup();
        assert_eq!(refs.resolve("refs/heads/missing").unwrap(), None);
    }

    #[test]
    fn direct_ref_resolves_to_its_hash() {
        let (_dir, refs) = setup();
        let commit = oid("ce013625030ba8dba906f756967f9e9ca394464a");
        refs.create_ref("refs/heads/master", &commit).unwrap();

        assert_eq!(refs.resolve("refs/heads/master").unwrap(), Some(commit));
    }

    #[test]
    fn symbolic_chain_resolves_through_head() {
        let (_dir, refs) = setup();
        let commit = oid("ce013625030ba8dba906f756967f9e9ca394464a");
        refs.create_symref(HEAD_REF_NAME, "refs/heads/master").unwrap();
        refs.create_ref("refs/heads/master", &commit).unwrap();

        assert_eq!(refs.read_head().unwrap(), Some(commit));
    }

    #[test]
    fn cyclic_chain_fails_with_reference_cycle() {
        let (_dir, refs) = setup();
        refs.create_symref("refs/heads/a", "refs/heads/b").unwrap();
        refs.create_symref("refs/heads/b", "refs/heads/a").unwrap();

        let err = refs.resolve("refs/heads/a").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VesError>(),
            Some(VesError::ReferenceCycle(_))
        ));
    }

    #[test]
    fn unborn_branch_still_names_head() {
        let (_dir, refs) = setup();
        refs.create_symref(HEAD_REF_NAME, "refs/heads/master").unwrap();

        let state = refs.head_state().unwrap();
        assert_eq!(
            state,
            HeadState::Branch {
                name: "master".to_string(),
                oid: None
            }
        );
    }

    #[test]
    fn commit_on_symbolic_head_creates_the_branch_file() {
        let (_dir, refs) = setup();
        let commit = oid("ce013625030ba8dba906f756967f9e9ca394464a");
        refs.create_symref(HEAD_REF_NAME, "refs/heads/master").unwrap();
        refs.update_current(&commit).unwrap();

        assert!(refs.ref_exists("refs/heads/master"));
        assert_eq!(refs.resolve("refs/heads/master").unwrap(), Some(commit.clone()));
        // HEAD stays symbolic
        assert_eq!(
            refs.head_target().unwrap(),
            Some("refs/heads/master".to_string())
        );
    }

    #[test]
    fn commit_on_detached_head_rewrites_head_itself() {
        let (_dir, refs) = setup();
        let old = oid("ce013625030ba8dba906f756967f9e9ca394464a");
        let new = oid("e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
        refs.create_ref(HEAD_REF_NAME, &old).unwrap();
        refs.update_current(&new).unwrap();

        assert_eq!(refs.head_state().unwrap(), HeadState::Detached(new));
        assert!(!refs.ref_exists("refs/heads/master"));
    }

    #[test]
    fn listing_returns_nested_resolved_mapping() {
        let (_dir, refs) = setup();
        let commit = oid("ce013625030ba8dba906f756967f9e9ca394464a");
        refs.create_ref("refs/heads/master", &commit).unwrap();
        refs.create_ref("refs/heads/feature/x", &commit).unwrap();
        refs.create_ref("refs/tags/v1.0", &commit).unwrap();

        let listing = refs.list().unwrap();
        let heads = match listing.get("heads").unwrap() {
            RefNode::Dir(nodes) => nodes,
            _ => panic!("expected heads to be a directory"),
        };
        assert!(matches!(heads.get("master").unwrap(), RefNode::Leaf(Some(_))));
        assert!(matches!(heads.get("feature").unwrap(), RefNode::Dir(_)));
    }
}
