//! Data structures and algorithms of the engine
//!
//! - `checkout`: Tree materialization into a destination directory
//! - `config`: Repository and user configuration (TOML)
//! - `ignore`: Layered ignore-pattern rule sets and evaluation
//! - `index`: Index (staging file) binary format types
//! - `kvlm`: Key/value-with-message envelope used by commits and tags
//! - `objects`: Object types (blob, tree, commit, annotated tag)
//! - `resolve`: Object name resolution (HEAD, short hashes, refs)
//! - `status`: Three-way status between HEAD, index, and worktree

pub mod checkout;
pub mod config;
pub mod ignore;
pub mod index;
pub mod kvlm;
pub mod objects;
pub mod resolve;
pub mod status;
