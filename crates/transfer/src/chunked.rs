use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tracing::trace;

use crate::types::Chunk;
use crate::{MAX_CHUNK_SIZE, TransferError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Returns the size of a regular file in bytes.
pub fn file_size(path: &Path) -> Result<u64, TransferError> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(TransferError::NotAFile(path.display().to_string()));
    }
    Ok(metadata.len())
}

// ---------------------------------------------------------------------------
// ChunkSource
// ---------------------------------------------------------------------------

/// Lazy, pull-based producer of upload chunks.
///
/// Implementations hand out chunks with contiguous segment indices starting
/// at 0. Nothing is read ahead: the next chunk is produced only when
/// [`next_chunk`](ChunkSource::next_chunk) is called again.
pub trait ChunkSource: Send {
    /// Produces the next chunk, or `None` once the source is drained.
    fn next_chunk(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Chunk>, TransferError>> + Send + '_>>;

    /// Whether the source has already seen its end.
    ///
    /// May turn `true` together with the final chunk, before the caller is
    /// done with it.
    fn is_exhausted(&self) -> bool;
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Reads a file in fixed-size chunks.
///
/// The read is bounded by the file size captured at open time, or by a
/// tighter [`with_limit`](ChunkReader::with_limit), so the total never
/// exceeds what was declared to the server even if the file keeps growing.
pub struct ChunkReader {
    file: tokio::fs::File,
    path: PathBuf,
    chunk_size: usize,
    offset: u64,
    limit: u64,
    next_index: u32,
    exhausted: bool,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    ///
    /// A `chunk_size` of 0 or above [`MAX_CHUNK_SIZE`] is clamped to
    /// [`MAX_CHUNK_SIZE`].
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        let file = tokio::fs::File::open(path).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(TransferError::NotAFile(path.display().to_string()));
        }
        let chunk_size = if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
            MAX_CHUNK_SIZE
        } else {
            chunk_size
        };
        Ok(Self {
            file,
            path: path.to_path_buf(),
            chunk_size,
            offset: 0,
            limit: metadata.len(),
            next_index: 0,
            exhausted: false,
        })
    }

    /// Caps the total bytes read at `bytes`.
    ///
    /// Pass the size declared to the server so a file that grew since it
    /// was measured still yields exactly that many bytes.
    pub fn with_limit(mut self, bytes: u64) -> Self {
        self.limit = self.limit.min(bytes);
        self
    }

    async fn read_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        if self.exhausted {
            return Ok(None);
        }

        let remaining = self.limit.saturating_sub(self.offset);
        if remaining == 0 {
            self.exhausted = true;
            return Ok(None);
        }

        let want = remaining.min(self.chunk_size as u64) as usize;
        let mut buf = vec![0u8; want];
        let mut filled = 0;
        while filled < want {
            let n = self.file.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        // File shrank underneath us.
        if filled == 0 {
            self.exhausted = true;
            return Ok(None);
        }
        buf.truncate(filled);

        let chunk = Chunk {
            segment_index: self.next_index,
            offset: self.offset,
            checksum: checksum_bytes(&buf),
            data: buf,
        };
        self.offset += filled as u64;
        self.next_index += 1;
        if self.offset >= self.limit {
            self.exhausted = true;
        }

        trace!(
            path = %self.path.display(),
            segment_index = chunk.segment_index,
            bytes = filled,
            "read chunk"
        );
        Ok(Some(chunk))
    }

    /// Effective chunk size after clamping.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl ChunkSource for ChunkReader {
    fn next_chunk(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Chunk>, TransferError>> + Send + '_>> {
        Box::pin(self.read_chunk())
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
