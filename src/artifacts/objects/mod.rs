//! Object model (blob, tree, commit, annotated tag)
//!
//! All objects share the framed on-disk form `{type} {size}\0{payload}`,
//! compressed with zlib and addressed by the SHA-1 of the uncompressed frame.

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tag;
pub mod tree;

/// Length of a hex object id
pub const OBJECT_ID_LENGTH: usize = 40;

/// Length of a raw (binary) object id
pub const RAW_OBJECT_ID_LENGTH: usize = 20;
