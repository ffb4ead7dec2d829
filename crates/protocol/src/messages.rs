use serde::{Deserialize, Serialize};

use crate::constants::HttpMethod;
use crate::types::{MediaCategory, MediaId};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// One request of the INIT → APPEND → FINALIZE → STATUS protocol.
///
/// Serializes to the flat parameter object the endpoint expects, with the
/// variant name in the `command` field. Field names are part of the wire
/// contract and must not be renamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadCommand {
    /// Opens an upload and declares its size and type.
    Init {
        media_type: String,
        total_bytes: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media_category: Option<MediaCategory>,
    },
    /// Sends one chunk. `media` is base64 on the wire.
    Append {
        media_id: MediaId,
        segment_index: u32,
        #[serde(with = "base64_bytes")]
        media: Vec<u8>,
    },
    /// Closes the upload once every segment has been appended.
    Finalize { media_id: MediaId },
    /// Queries asynchronous processing state.
    Status { media_id: MediaId },
}

impl UploadCommand {
    pub fn init(
        media_type: impl Into<String>,
        total_bytes: u64,
        media_category: Option<MediaCategory>,
    ) -> Self {
        UploadCommand::Init {
            media_type: media_type.into(),
            total_bytes,
            media_category,
        }
    }

    pub fn append(media_id: &MediaId, segment_index: u32, media: Vec<u8>) -> Self {
        UploadCommand::Append {
            media_id: media_id.clone(),
            segment_index,
            media,
        }
    }

    pub fn finalize(media_id: &MediaId) -> Self {
        UploadCommand::Finalize {
            media_id: media_id.clone(),
        }
    }

    pub fn status(media_id: &MediaId) -> Self {
        UploadCommand::Status {
            media_id: media_id.clone(),
        }
    }

    /// Wire name of the command (`INIT`, `APPEND`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            UploadCommand::Init { .. } => "INIT",
            UploadCommand::Append { .. } => "APPEND",
            UploadCommand::Finalize { .. } => "FINALIZE",
            UploadCommand::Status { .. } => "STATUS",
        }
    }

    /// STATUS is a read; everything else mutates the upload.
    pub fn method(&self) -> HttpMethod {
        match self {
            UploadCommand::Status { .. } => HttpMethod::Get,
            _ => HttpMethod::Post,
        }
    }

    /// Builds the parameter object handed to the transport.
    pub fn to_params(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Standard-alphabet, padded base64 for chunk payloads.
mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
