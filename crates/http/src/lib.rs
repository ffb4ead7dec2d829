//! HTTP transport for the media upload API.
//!
//! Implements [`mediadrop_uploader::Transport`] with `reqwest` and Bearer
//! token authentication.

pub mod client;

pub use client::{DEFAULT_BASE_URL, HttpError, HttpTransport};
