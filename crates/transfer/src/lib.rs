//! Chunked file reading for media uploads.
//!
//! Files are read lazily in bounded chunks; the consumer pulls one chunk,
//! finishes with it, and only then pulls the next, so at most one chunk is
//! held in memory per upload.

mod chunked;
mod media_type;
mod types;

pub use chunked::{ChunkReader, ChunkSource, checksum_bytes, file_size};
pub use media_type::{DEFAULT_MEDIA_TYPE, detect_media_type};
pub use types::Chunk;

/// Largest chunk sent in a single APPEND: 5 MiB.
pub const MAX_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a regular file: {0}")]
    NotAFile(String),
}
