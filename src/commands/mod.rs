//! Command implementations
//!
//! Thin bodies over the library core, organized the way Git splits its
//! surface:
//!
//! - `plumbing`: direct access to objects, refs, and the index
//!   (cat-file, hash-object, ls-tree, ls-files, check-ignore, show-ref,
//!   rev-parse)
//! - `porcelain`: user-facing workflows (init, add, rm, commit, status,
//!   tag, checkout)

pub mod plumbing;
pub mod porcelain;
