//! vestigium - a Git-compatible local version-control engine
//!
//! Content-addressed object store, staging index, reference namespace, and
//! the algorithms bridging them (tree construction, status, ignore rules,
//! name resolution). The binary formats (object framing, tree entries, the
//! `DIRC` index file) are bit-exact compatible with Git, so a repository
//! written here can be inspected with stock Git tooling.
//!
//! # Layout
//!
//! - [`areas`]: the stateful subsystems (repository, object database,
//!   refs, index, workspace)
//! - [`artifacts`]: data structures and algorithms (objects, KVLM, ignore
//!   rules, status, name resolution, checkout)
//! - [`commands`]: thin command bodies used by the `ves` binary
//!
//! # Example
//!
//! ```no_run
//! use vestigium::areas::repository::Repository;
//! use std::path::Path;
//!
//! let repo = Repository::create(Path::new("/tmp/demo"), Box::new(std::io::stdout())).unwrap();
//! repo.add(&["notes.txt".to_string()]).unwrap();
//! repo.commit("first").unwrap();
//! ```

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod error;

pub use areas::repository::Repository;
pub use artifacts::objects::object_id::ObjectId;
pub use artifacts::objects::object_type::ObjectType;
pub use error::VesError;
