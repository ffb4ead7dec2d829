//! Wire types for the chunked media upload endpoint.
//!
//! Pure request shaping and response decoding. Nothing in this crate
//! performs I/O; the uploader hands the produced parameter objects to a
//! transport and feeds the returned bodies back through these types.

pub mod constants;
pub mod messages;
pub mod types;

pub use constants::{HttpMethod, MEDIA_UPLOAD_ENDPOINT};
pub use messages::UploadCommand;
pub use types::{
    ApiResponse, InitResponse, MediaCategory, MediaId, ProcessingError, ProcessingInfo,
    ProcessingState, RawResponse,
};
