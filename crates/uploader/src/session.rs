//! Upload session: INIT, APPEND*, FINALIZE, then optional processing poll.
//!
//! One session uploads one file. Chunks are pulled from a [`ChunkSource`]
//! one at a time and each APPEND is awaited before the next chunk is read,
//! so there is never more than one request in flight. FINALIZE is gated on
//! both "source exhausted" and "last APPEND acknowledged" through a
//! [`CompletionGate`], whichever order those arrive in.

use std::path::{Path, PathBuf};

use mediadrop_protocol::{ApiResponse, InitResponse, MediaId, UploadCommand};
use mediadrop_transfer::{ChunkReader, ChunkSource};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::classifier::{MediaDescriptor, classify};
use crate::error::UploadError;
use crate::gate::{CompletionGate, GateAction};
use crate::poller::ProcessingPoller;
use crate::transport::{Transport, send_command};
use crate::types::{UploadEvent, UploaderConfig};

/// Lifecycle of an [`UploadSession`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Initializing,
    Streaming,
    Finalizing,
    Polling,
    Done,
    Failed,
}

/// A single file upload.
pub struct UploadSession<'a, T: Transport + ?Sized> {
    path: PathBuf,
    transport: &'a T,
    config: &'a UploaderConfig,
    events_tx: Option<&'a mpsc::Sender<UploadEvent>>,
    state: SessionState,
    media_id: Option<MediaId>,
    segment_index: u32,
    bytes_sent: u64,
}

impl<'a, T: Transport + ?Sized> UploadSession<'a, T> {
    pub fn new(path: impl Into<PathBuf>, transport: &'a T, config: &'a UploaderConfig) -> Self {
        Self {
            path: path.into(),
            transport,
            config,
            events_tx: None,
            state: SessionState::Idle,
            media_id: None,
            segment_index: 0,
            bytes_sent: 0,
        }
    }

    /// Sends progress events to `events_tx`.
    ///
    /// Sends wait for channel capacity, so the receiver must be drained
    /// while the upload runs, not after it returns.
    pub fn with_events(mut self, events_tx: Option<&'a mpsc::Sender<UploadEvent>>) -> Self {
        self.events_tx = events_tx;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Server-assigned id, once INIT has succeeded.
    pub fn media_id(&self) -> Option<&MediaId> {
        self.media_id.as_ref()
    }

    /// Uploads the file at the session path, reading it in chunks of
    /// `config.chunk_size`.
    ///
    /// The file is opened only after INIT succeeds.
    pub async fn run(&mut self) -> Result<ApiResponse, UploadError> {
        let result = self.drive(None::<ChunkReader>).await;
        self.settle(result).await
    }

    /// Like [`run`](Self::run), but streams chunks from `source` instead of
    /// opening the file. The path is still used for classification.
    pub async fn run_with_source<S: ChunkSource>(
        &mut self,
        source: S,
    ) -> Result<ApiResponse, UploadError> {
        let result = self.drive(Some(source)).await;
        self.settle(result).await
    }

    async fn drive<S: ChunkSource>(
        &mut self,
        source: Option<S>,
    ) -> Result<ApiResponse, UploadError> {
        let descriptor = classify(&self.path, &self.config.policy)?;
        debug!(
            path = %self.path.display(),
            media_type = %descriptor.media_type,
            size_bytes = descriptor.size_bytes,
            category = ?descriptor.category,
            "classified media"
        );

        let media_id = self.init(&descriptor).await?;

        self.transition(SessionState::Streaming);
        match source {
            Some(mut source) => self.stream(&media_id, &descriptor, &mut source).await?,
            None => {
                let mut reader = ChunkReader::open(&self.path, self.config.chunk_size)
                    .await?
                    .with_limit(descriptor.size_bytes);
                self.stream(&media_id, &descriptor, &mut reader).await?
            }
        }

        self.finalize(&media_id).await
    }

    async fn init(&mut self, descriptor: &MediaDescriptor) -> Result<MediaId, UploadError> {
        self.transition(SessionState::Initializing);

        let command = UploadCommand::init(
            descriptor.media_type.as_str(),
            descriptor.size_bytes,
            descriptor.category,
        );
        let resp = send_command(self.transport, &command).await?;
        let media_id = resp
            .parse_body::<InitResponse>()?
            .media_id()
            .ok_or_else(|| UploadError::Protocol("INIT response carries no media id".into()))?;

        info!(
            media_id = %media_id,
            media_type = %descriptor.media_type,
            total_bytes = descriptor.size_bytes,
            "upload initialized"
        );
        self.media_id = Some(media_id.clone());
        self.emit(UploadEvent::Initialized {
            media_id: media_id.clone(),
            descriptor: descriptor.clone(),
        })
        .await;

        Ok(media_id)
    }

    /// Pulls and appends chunks until the gate opens for FINALIZE.
    async fn stream<S: ChunkSource>(
        &mut self,
        media_id: &MediaId,
        descriptor: &MediaDescriptor,
        source: &mut S,
    ) -> Result<(), UploadError> {
        let mut gate = CompletionGate::new();

        while !gate.is_finalizing() {
            let Some(chunk) = source.next_chunk().await? else {
                gate.source_exhausted();
                continue;
            };

            gate.append_started();
            // The source may already know this was its last chunk.
            if source.is_exhausted() {
                gate.source_exhausted();
            }

            let len = chunk.len() as u64;
            let offset = chunk.offset;
            let checksum = chunk.checksum;
            let command = UploadCommand::append(media_id, self.segment_index, chunk.data);
            send_command(self.transport, &command).await?;

            self.bytes_sent += len;
            debug!(
                media_id = %media_id,
                segment_index = self.segment_index,
                offset,
                bytes = len,
                checksum = %checksum,
                bytes_sent = self.bytes_sent,
                total_bytes = descriptor.size_bytes,
                "chunk appended"
            );
            self.emit(UploadEvent::ChunkAppended {
                media_id: media_id.clone(),
                segment_index: self.segment_index,
                checksum,
                bytes_sent: self.bytes_sent,
                total_bytes: descriptor.size_bytes,
            })
            .await;
            self.segment_index += 1;

            if gate.append_acked() == GateAction::Finalize {
                debug!(media_id = %media_id, segments = self.segment_index, "stream complete");
            }
        }

        Ok(())
    }

    async fn finalize(&mut self, media_id: &MediaId) -> Result<ApiResponse, UploadError> {
        self.transition(SessionState::Finalizing);

        let resp = send_command(self.transport, &UploadCommand::finalize(media_id)).await?;
        info!(media_id = %media_id, segments = self.segment_index, "upload finalized");
        self.emit(UploadEvent::Finalized {
            media_id: media_id.clone(),
        })
        .await;

        let Some(processing) = resp.processing_info()? else {
            return Ok(resp);
        };

        if !processing.state.is_terminal() {
            self.transition(SessionState::Polling);
        }
        ProcessingPoller::new(self.transport, &self.config.poll)
            .with_events(self.events_tx)
            .poll(media_id, resp, processing)
            .await
    }

    /// Records the outcome and emits the closing event.
    async fn settle(
        &mut self,
        result: Result<ApiResponse, UploadError>,
    ) -> Result<ApiResponse, UploadError> {
        match &result {
            Ok(_) => {
                self.transition(SessionState::Done);
                if let Some(media_id) = self.media_id.clone() {
                    info!(media_id = %media_id, "upload complete");
                    self.emit(UploadEvent::Completed { media_id }).await;
                }
            }
            Err(e) => {
                self.transition(SessionState::Failed);
                let err_msg = e.to_string();
                error!(
                    path = %self.path.display(),
                    media_id = ?self.media_id.as_ref().map(MediaId::as_str),
                    error = %err_msg,
                    "upload failed"
                );
                self.emit(UploadEvent::Failed { error: err_msg }).await;
            }
        }
        result
    }

    fn transition(&mut self, next: SessionState) {
        debug!(path = %self.path.display(), from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    async fn emit(&self, event: UploadEvent) {
        if let Some(tx) = self.events_tx {
            let _ = tx.send(event).await;
        }
    }
}

/// Reusable entry point owning a transport and configuration.
pub struct MediaUploader<T: Transport> {
    transport: T,
    config: UploaderConfig,
    events_tx: Option<mpsc::Sender<UploadEvent>>,
}

impl<T: Transport> MediaUploader<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, UploaderConfig::default())
    }

    pub fn with_config(transport: T, config: UploaderConfig) -> Self {
        Self {
            transport,
            config,
            events_tx: None,
        }
    }

    /// Sends progress events for every upload to `events_tx`.
    ///
    /// Sends wait for channel capacity; drain the receiver concurrently
    /// (e.g. from a spawned task) or uploads stall once it fills.
    pub fn with_events(mut self, events_tx: mpsc::Sender<UploadEvent>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Uploads one file. Uploads run independently; each gets its own session.
    pub async fn upload(&self, path: &Path) -> Result<ApiResponse, UploadError> {
        UploadSession::new(path, &self.transport, &self.config)
            .with_events(self.events_tx.as_ref())
            .run()
            .await
    }

    /// Uploads `path` with chunks pulled from `source`.
    pub async fn upload_with_source<S: ChunkSource>(
        &self,
        path: &Path,
        source: S,
    ) -> Result<ApiResponse, UploadError> {
        UploadSession::new(path, &self.transport, &self.config)
            .with_events(self.events_tx.as_ref())
            .run_with_source(source)
            .await
    }
}

/// Uploads `path` with default settings and reports the outcome to
/// `on_complete`, which runs exactly once.
pub async fn upload_media<T, F>(path: &Path, transport: &T, on_complete: F)
where
    T: Transport + ?Sized,
    F: FnOnce(Result<ApiResponse, UploadError>),
{
    let config = UploaderConfig::default();
    let result = UploadSession::new(path, transport, &config).run().await;
    on_complete(result);
}
