//! Upload error types.

use crate::transport::TransportError;

/// Errors that terminate an upload. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("file is {actual} bytes, limit for this media type is {limit} bytes")]
    Oversize { limit: u64, actual: u64 },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Server-side processing failed; displays the server message verbatim.
    #[error("{0}")]
    ProcessingFailed(String),

    #[error("file access error: {0}")]
    FileAccess(#[from] mediadrop_transfer::TransferError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("processing still unfinished after {polls} status checks")]
    PollLimit { polls: u32 },
}
