//! Error types for `rslkit`

use thiserror::Error;

/// The error type for `rslkit` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected end of buffer while reading.
    #[error("unexpected end of buffer at offset {offset:#x}")]
    UnexpectedEof {
        /// The offset at which the read ran past the buffer.
        offset: u64,
    },

    /// A seek target lies outside the buffer.
    #[error("seek target {target:#x} outside buffer of {len} bytes")]
    SeekOutOfRange {
        /// The requested absolute offset.
        target: u64,
        /// The buffer length in bytes.
        len: usize,
    },

    // ==================== RMHG Container Errors ====================
    /// The buffer is not a valid RMHG container (missing RMHG magic).
    #[error("invalid RMHG magic: expected RMHG, found {0:?}")]
    InvalidRmhgMagic(String),

    /// The container's declared size does not satisfy the trailing-size
    /// relation against its record table.
    #[error("RMHG trailing-size check failed: declared {declared:#x} for {records} records")]
    ContainerSizeCheck {
        /// The declared total size from the container header.
        declared: u32,
        /// The number of top-level records.
        records: usize,
    },

    // ==================== GCT0 Texture Errors ====================
    /// The record at the given offset is not a GCT0 texture.
    #[error("missing GCT0 magic at offset {offset:#x}")]
    MissingGct0Magic {
        /// The offset where the GCT0 tag was expected.
        offset: u64,
    },

    // ==================== CGMG Model Errors ====================
    /// A pointer field references an address that is not a known record
    /// start in its category's address table.
    #[error("unresolved {table} address {address:#x}")]
    UnresolvedAddress {
        /// The record category the address was resolved against.
        table: &'static str,
        /// The unresolvable file offset.
        address: u32,
    },

    /// A linked record list revisited an address it already walked.
    #[error("cyclic record list at address {address:#x}")]
    ListCycle {
        /// The first revisited record address.
        address: u32,
    },

    /// A vertex buffer header carries an unknown storage mode.
    #[error("unknown vertex storage mode {mode} (expected 1, 2 or 3)")]
    UnknownStorageMode {
        /// The raw storage mode byte.
        mode: u8,
    },

    /// A vertex buffer header carries an attribute type the codec table
    /// does not know. Surfaced per chunk; callers skip the chunk.
    #[error("unknown vertex attribute type {raw}")]
    UnknownAttributeType {
        /// The raw attribute type byte.
        raw: u8,
    },

    // ==================== Texture Decoding Errors ====================
    /// The external pixel decoder rejected a texture.
    #[error("pixel decode failed for format {format:#x}: {message}")]
    PixelDecodeFailed {
        /// The GameCube pixel format code.
        format: u32,
        /// The decoder's error message.
        message: String,
    },
}

/// A specialized Result type for `rslkit` operations.
pub type Result<T> = std::result::Result<T, Error>;
