//! Typed failure kinds surfaced by the engine
//!
//! Every fallible operation propagates `anyhow::Error`; failures with a
//! meaning callers may want to branch on are raised as a `VesError` so they
//! can be recovered with `err.downcast_ref::<VesError>()` without losing the
//! surrounding context chain.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum VesError {
    #[error("not a ves repository (or any of the parent directories): {0}")]
    NotARepository(PathBuf),

    #[error("unsupported repositoryformatversion: {0}")]
    UnsupportedFormat(u32),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("ambiguous object name {name}: candidates are {candidates:?}")]
    AmbiguousObject {
        name: String,
        candidates: Vec<String>,
    },

    #[error("malformed object: {0}")]
    MalformedObject(String),

    #[error("malformed index: {0}")]
    MalformedIndex(String),

    #[error("object {oid} is a {actual}, expected a {expected}")]
    TypeMismatch {
        oid: String,
        expected: String,
        actual: String,
    },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("user identity not configured; set user.name and user.email")]
    MissingIdentity,

    #[error("symbolic reference chain too deep or cyclic at {0}")]
    ReferenceCycle(String),

    #[error("checkout destination not empty: {0}")]
    DestinationNotEmpty(PathBuf),
}
