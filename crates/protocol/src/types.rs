use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Server-assigned handle correlating every call of one upload.
///
/// Always held in string form. The conversion from the server's numeric id
/// happens once, in [`InitResponse::media_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(String);

impl MediaId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MediaId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MediaId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-side handling hint sent with INIT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCategory {
    TweetImage,
    TweetGif,
    TweetVideo,
}

impl MediaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::TweetImage => "tweet_image",
            MediaCategory::TweetGif => "tweet_gif",
            MediaCategory::TweetVideo => "tweet_video",
        }
    }
}

impl std::fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a successful INIT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_after_secs: Option<u64>,
}

impl InitResponse {
    /// Prefers `media_id_string`; the numeric id loses precision in some
    /// JSON consumers and is only a fallback.
    pub fn media_id(&self) -> Option<MediaId> {
        match (&self.media_id_string, self.media_id) {
            (Some(s), _) if !s.is_empty() => Some(MediaId(s.clone())),
            (_, Some(n)) => Some(MediaId(n.to_string())),
            _ => None,
        }
    }
}

/// Asynchronous processing phase reported by FINALIZE and STATUS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Pending,
    InProgress,
    Failed,
    Succeeded,
}

impl ProcessingState {
    /// `true` for `failed` and `succeeded`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingState::Failed | ProcessingState::Succeeded)
    }
}

/// Error details attached to a `failed` processing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// The `processing_info` object of FINALIZE and STATUS responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingInfo {
    pub state: ProcessingState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_after_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProcessingError>,
}

impl ProcessingInfo {
    /// Server message of a failed state, empty when none was sent.
    pub fn error_message(&self) -> &str {
        self.error.as_ref().map(|e| e.message.as_str()).unwrap_or("")
    }
}

/// Transport-level details of a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// Parsed body plus the raw response it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub body: serde_json::Value,
    pub raw: RawResponse,
}

impl ApiResponse {
    pub fn new(body: serde_json::Value, raw: RawResponse) -> Self {
        Self { body, raw }
    }

    /// A 200 response carrying `body` and no headers.
    pub fn ok(body: serde_json::Value) -> Self {
        Self {
            body,
            raw: RawResponse {
                status: 200,
                headers: BTreeMap::new(),
            },
        }
    }

    /// Decodes the body into `T`.
    pub fn parse_body<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }

    /// Decodes `processing_info`; `Ok(None)` when the field is absent or null.
    pub fn processing_info(&self) -> Result<Option<ProcessingInfo>, serde_json::Error> {
        match self.body.get("processing_info") {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(v) => ProcessingInfo::deserialize(v).map(Some),
        }
    }
}
