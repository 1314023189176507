//! Index (staging file) binary format
//!
//! ## File layout (version 2)
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "DIRC" (4 bytes)
//!   - Version: 2 (big-endian u32)
//!   - Entry count (big-endian u32)
//!
//! Entries (variable length):
//!   - 62-byte fixed prefix, NUL-terminated name, 1-8 NUL padding bytes
//!     so each entry's length is a multiple of 8
//!   - Sorted ascending by name, ties broken by stage
//!
//! Trailer (20 bytes):
//!   - SHA-1 over all preceding bytes
//! ```

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

/// Size of the SHA-1 trailer in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of the index header in bytes
pub const HEADER_SIZE: usize = 12;

/// Magic signature identifying index files
pub const SIGNATURE: &str = "DIRC";

/// Index file format version
pub const VERSION: u32 = 2;
