//! Data types for the upload flow.

use std::time::Duration;

use mediadrop_protocol::{MediaId, ProcessingState};
use mediadrop_transfer::MAX_CHUNK_SIZE;

use crate::classifier::{MediaDescriptor, MediaPolicy};
use crate::poller::PollConfig;

/// Tunables for an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploaderConfig {
    /// Bytes per APPEND; clamped to 5 MiB by the reader.
    pub chunk_size: usize,
    pub policy: MediaPolicy,
    pub poll: PollConfig,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: MAX_CHUNK_SIZE,
            policy: MediaPolicy::default(),
            poll: PollConfig::default(),
        }
    }
}

/// Progress event emitted while an upload runs.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// INIT succeeded.
    Initialized {
        media_id: MediaId,
        descriptor: MediaDescriptor,
    },
    /// One APPEND was acknowledged.
    ChunkAppended {
        media_id: MediaId,
        segment_index: u32,
        /// SHA-256 hex digest of the appended bytes.
        checksum: String,
        bytes_sent: u64,
        total_bytes: u64,
    },
    /// FINALIZE was acknowledged.
    Finalized { media_id: MediaId },
    /// Server-side processing is still running.
    Processing {
        media_id: MediaId,
        state: ProcessingState,
        progress_percent: Option<u32>,
        check_after: Duration,
    },
    /// Upload finished successfully.
    Completed { media_id: MediaId },
    /// Upload failed; no further events follow.
    Failed { error: String },
}
