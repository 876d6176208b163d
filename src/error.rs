//! Layered error types. Each fallible boundary in the crate (byte I/O and
//! compression, the NBT codec, the tag schema, the region engine) gets its
//! own enum; `Error` is the union callers of `World`/`Region`/`Chunk` see,
//! with `From` impls so `?` composes across boundaries.

use std::io;

use crate::nbt::TagId;

/// Which wire format a compressed stream is encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    Zlib,
    Gzip,
}

impl std::fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionMode::Zlib => write!(f, "zlib"),
            CompressionMode::Gzip => write!(f, "gzip"),
        }
    }
}

/// Failures from the gzip/zlib wrapper in [`crate::byteio`].
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    #[error("failed to inflate {mode} stream: {source}")]
    Inflate {
        mode: CompressionMode,
        #[source]
        source: io::Error,
    },
    #[error("failed to deflate {mode} stream: {source}")]
    Deflate {
        mode: CompressionMode,
        #[source]
        source: io::Error,
    },
}

/// Failures decoding a tag tree from its wire representation.
#[derive(Debug, thiserror::Error)]
pub enum NbtDecodeError {
    #[error("unknown tag id {id} at byte offset {offset}")]
    UnknownTagId { id: u8, offset: usize },
    #[error("truncated NBT buffer at offset {offset}: needed {needed} more bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("compound tag name has zero length at byte offset {offset}")]
    ZeroLengthName { offset: usize },
    #[error("invalid UTF-8 in tag name or string payload at byte offset {offset}")]
    InvalidUtf8 { offset: usize },
}

/// Failures validating a tag tree against a [`crate::schema::Schema`].
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("'{name}' is not a recognized tag name for this schema")]
    UnknownKey { name: String },
    #[error("tag '{name}' has type {actual:?}, schema expects {expected:?}")]
    BadType {
        name: String,
        expected: TagId,
        actual: TagId,
    },
}

/// Failures accessing a [`crate::nbt::Compound`] via its typed convenience
/// getters (`get_i32`, `get_compound_tag`, ...).
#[derive(Debug, thiserror::Error)]
pub enum TagAccessError {
    #[error("no tag named '{name}' in compound")]
    Missing { name: String },
    #[error("tag '{name}' has type {actual:?}, expected {expected:?}")]
    WrongType {
        name: String,
        expected: TagId,
        actual: TagId,
    },
}

/// The crate-wide error type. Every public fallible operation on
/// [`crate::World`], [`crate::region::Region`], and [`crate::chunk::Chunk`]
/// returns `Result<T, Error>`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("compression error: {0}")]
    Compress(#[from] CompressError),

    #[error("NBT decode error: {0}")]
    NbtDecode(#[from] NbtDecodeError),

    #[error("NBT schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("NBT tag access error: {0}")]
    TagAccess(#[from] TagAccessError),

    #[error("coordinate out of range: {what} = {value} ({reason})")]
    CoordinateOutOfRange {
        what: &'static str,
        value: i64,
        reason: &'static str,
    },

    #[error("region buffer overflow: needed {needed} bytes, capacity {capacity}")]
    BufferOverflow { needed: usize, capacity: usize },

    #[error("chunk ({chunk_x}, {chunk_z}) not found in region ({region_x}, {region_z})")]
    ChunkNotFound {
        region_x: i32,
        region_z: i32,
        chunk_x: u8,
        chunk_z: u8,
    },

    #[error("region ({region_x}, {region_z}) not found")]
    RegionNotFound { region_x: i32, region_z: i32 },

    #[error("unrecognized chunk compression id {id}")]
    InvalidCompressionId { id: u8 },

    #[error("invalid chunk length {length} in region ({region_x}, {region_z}): must be at least 1")]
    InvalidChunkLength {
        region_x: i32,
        region_z: i32,
        length: u32,
    },
}
