//! Repository discovery, creation, and coordination
//!
//! `Repository` locates and validates the on-disk layout and hands out the
//! subsystems built on top of it (database, index, refs, workspace). It is
//! the entry point every command goes through.
//!
//! ## Layout
//!
//! ```text
//! <worktree>/.ves/
//!   HEAD          symbolic or direct reference
//!   config        core settings (TOML)
//!   description   free text, not interpreted
//!   objects/      content-addressed object store
//!   refs/heads/   branch references
//!   refs/tags/    tag references
//!   branches/     historical, kept for layout compatibility
//!   index         binary staging file
//!   info/exclude  optional repository-local ignore rules
//! ```

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::{Workspace, VES_DIR};
use crate::artifacts::config::RepoConfig;
use crate::error::VesError;
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Object database directory name
const DATABASE_DIR: &str = "objects";

/// Index file name
const INDEX_FILE: &str = "index";

/// Default branch HEAD points at in a fresh repository
pub const DEFAULT_BRANCH: &str = "master";

pub struct Repository {
    /// Worktree root
    path: Box<Path>,
    /// Metadata directory (`<worktree>/.ves`)
    ves_dir: Box<Path>,
    config: RepoConfig,
    /// Staging index, loaded lazily by commands
    index: RefCell<Index>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
    /// Output sink for command results (stdout outside of tests)
    writer: RefCell<Box<dyn Write>>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.path)
            .field("ves_dir", &self.ves_dir)
            .field("config", &self.config)
            .field("index", &self.index)
            .field("database", &self.database)
            .field("workspace", &self.workspace)
            .field("refs", &self.refs)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Open an existing repository rooted at `path`
    ///
    /// Fails with *unsupported-format* when the configuration declares a
    /// repository format version other than 0.
    pub fn open(path: &Path, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        let path = path
            .canonicalize()
            .with_context(|| format!("failed to canonicalize {}", path.display()))?;
        let ves_dir = path.join(VES_DIR);

        if !ves_dir.is_dir() {
            anyhow::bail!(VesError::NotARepository(path));
        }

        let config = RepoConfig::load(&ves_dir.join("config"))?;
        config.validate()?;

        Ok(Self::assemble(path, ves_dir, config, writer))
    }

    /// Create the repository skeleton at `path` and open it
    ///
    /// The worktree directory is created if missing; an existing, non-empty
    /// metadata directory is refused.
    pub fn create(path: &Path, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        if path.exists() && !path.is_dir() {
            anyhow::bail!(VesError::InvalidPath(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        std::fs::create_dir_all(path)
            .with_context(|| format!("failed to create worktree {}", path.display()))?;

        let path = path.canonicalize()?;
        let ves_dir = path.join(VES_DIR);

        if ves_dir.exists() && ves_dir.read_dir()?.next().is_some() {
            anyhow::bail!(VesError::InvalidPath(format!(
                "{} already contains a repository",
                path.display()
            )));
        }

        for dir in ["branches", DATABASE_DIR, "refs/tags", "refs/heads"] {
            std::fs::create_dir_all(ves_dir.join(dir))
                .with_context(|| format!("failed to create {dir} directory"))?;
        }

        std::fs::write(
            ves_dir.join("description"),
            "Unnamed repository; edit this file 'description' to name the repository.\n",
        )
        .context("failed to write description file")?;

        std::fs::write(
            ves_dir.join("HEAD"),
            format!("ref: refs/heads/{DEFAULT_BRANCH}\n"),
        )
        .context("failed to write HEAD file")?;

        let config = RepoConfig::default();
        config.save(&ves_dir.join("config"))?;

        debug!(path = %path.display(), "repository created");
        Ok(Self::assemble(path, ves_dir, config, writer))
    }

    /// Walk upward from `start` until a repository skeleton is found
    pub fn find(start: &Path, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        let start = start
            .canonicalize()
            .with_context(|| format!("failed to canonicalize {}", start.display()))?;

        let mut current = start.as_path();
        loop {
            if current.join(VES_DIR).is_dir() {
                return Self::open(current, writer);
            }
            current = match current.parent() {
                Some(parent) => parent,
                None => anyhow::bail!(VesError::NotARepository(start.clone())),
            };
        }
    }

    fn assemble(
        path: PathBuf,
        ves_dir: PathBuf,
        config: RepoConfig,
        writer: Box<dyn Write>,
    ) -> Self {
        let index = Index::new(ves_dir.join(INDEX_FILE).into_boxed_path());
        let database = Database::new(ves_dir.join(DATABASE_DIR).into_boxed_path());
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(ves_dir.clone().into_boxed_path());

        Repository {
            path: path.into_boxed_path(),
            ves_dir: ves_dir.into_boxed_path(),
            config,
            index: RefCell::new(index),
            database,
            workspace,
            refs,
            writer: RefCell::new(writer),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ves_dir(&self) -> &Path {
        &self.ves_dir
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// Mutable access to the staging index
    pub fn index(&self) -> RefMut<'_, Index> {
        self.index.borrow_mut()
    }

    /// Load the staging index from disk and return it
    pub fn load_index(&self) -> anyhow::Result<RefMut<'_, Index>> {
        let mut index = self.index.borrow_mut();
        index.rehydrate()?;
        Ok(index)
    }

    pub fn writer(&self) -> RefMut<'_, Box<dyn Write>> {
        self.writer.borrow_mut()
    }
}
