//! Chunked media upload flow.
//!
//! This crate implements the **state machine** for pushing one local file
//! to a media upload endpoint. It has no HTTP dependency: callers provide a
//! [`Transport`] implementation that issues the actual requests.
//!
//! # Pipeline
//!
//! 1. **Classify**: size ceiling and category from the media policy table
//! 2. **Init**: declare type and size, receive the media id
//! 3. **Append**: send chunks one at a time, in order
//! 4. **Finalize**: close the upload exactly once
//! 5. **Poll**: wait out server-side processing when the server asks for it

pub mod classifier;
pub mod error;
pub mod gate;
pub mod poller;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use classifier::{
    IMAGE_MAX_BYTES, MediaDescriptor, MediaPolicy, PolicyRule, VIDEO_MAX_BYTES, classify,
};
pub use error::UploadError;
pub use gate::{CompletionGate, GateAction};
pub use poller::{PollConfig, ProcessingPoller};
pub use session::{MediaUploader, SessionState, UploadSession, upload_media};
pub use transport::{Transport, TransportError, TransportFuture};
pub use types::{UploadEvent, UploaderConfig};

pub use mediadrop_protocol::{ApiResponse, MediaCategory, MediaId, RawResponse};
