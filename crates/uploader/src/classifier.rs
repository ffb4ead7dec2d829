//! Size ceiling and category selection.
//!
//! Policy lives in a data table keyed by MIME type, so supporting a new
//! media type means adding a [`PolicyRule`], not a branch.

use std::path::Path;

use mediadrop_protocol::MediaCategory;
use mediadrop_transfer::{detect_media_type, file_size};
use serde::{Deserialize, Serialize};

use crate::error::UploadError;

/// Ceiling for images, GIFs, and anything not listed: 15 MiB.
pub const IMAGE_MAX_BYTES: u64 = 15 * 1024 * 1024;

/// Ceiling for chunked video: 512 MiB.
pub const VIDEO_MAX_BYTES: u64 = 512 * 1024 * 1024;

/// Per-MIME-type upload policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<MediaCategory>,
    pub max_bytes: u64,
}

impl PolicyRule {
    pub fn new(media_type: &str, category: Option<MediaCategory>, max_bytes: u64) -> Self {
        Self {
            media_type: media_type.to_string(),
            category,
            max_bytes,
        }
    }
}

/// Lookup table from MIME type to size ceiling and category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPolicy {
    #[serde(default = "default_rules")]
    pub rules: Vec<PolicyRule>,
    /// Ceiling for types without a rule. They get no category.
    #[serde(default = "default_max_bytes")]
    pub default_max_bytes: u64,
}

fn default_rules() -> Vec<PolicyRule> {
    vec![
        PolicyRule::new("image/png", Some(MediaCategory::TweetImage), IMAGE_MAX_BYTES),
        PolicyRule::new("image/jpeg", Some(MediaCategory::TweetImage), IMAGE_MAX_BYTES),
        PolicyRule::new("image/webp", Some(MediaCategory::TweetImage), IMAGE_MAX_BYTES),
        PolicyRule::new("image/gif", Some(MediaCategory::TweetGif), IMAGE_MAX_BYTES),
        PolicyRule::new("video/mp4", Some(MediaCategory::TweetVideo), VIDEO_MAX_BYTES),
    ]
}

fn default_max_bytes() -> u64 {
    IMAGE_MAX_BYTES
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            default_max_bytes: default_max_bytes(),
        }
    }
}

impl MediaPolicy {
    /// Returns the rule for an exact MIME match.
    pub fn rule_for(&self, media_type: &str) -> Option<&PolicyRule> {
        self.rules.iter().find(|r| r.media_type == media_type)
    }

    /// Adds a rule, replacing any existing rule for the same MIME type.
    pub fn with_rule(mut self, rule: PolicyRule) -> Self {
        self.rules.retain(|r| r.media_type != rule.media_type);
        self.rules.push(rule);
        self
    }

    /// Applies the table to a known type and size.
    pub fn describe(
        &self,
        media_type: &str,
        size_bytes: u64,
    ) -> Result<MediaDescriptor, UploadError> {
        let (category, max_allowed_bytes) = match self.rule_for(media_type) {
            Some(rule) => (rule.category, rule.max_bytes),
            None => (None, self.default_max_bytes),
        };

        if size_bytes >= max_allowed_bytes {
            return Err(UploadError::Oversize {
                limit: max_allowed_bytes,
                actual: size_bytes,
            });
        }

        Ok(MediaDescriptor {
            media_type: media_type.to_string(),
            size_bytes,
            max_allowed_bytes,
            category,
        })
    }
}

/// What INIT declares about the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    pub media_type: String,
    pub size_bytes: u64,
    pub max_allowed_bytes: u64,
    pub category: Option<MediaCategory>,
}

/// Classifies the file at `path` against `policy`.
///
/// Fails with [`UploadError::FileAccess`] if the file cannot be stat'ed and
/// with [`UploadError::Oversize`] if it is not strictly below its ceiling.
pub fn classify(path: &Path, policy: &MediaPolicy) -> Result<MediaDescriptor, UploadError> {
    let media_type = detect_media_type(path);
    let size_bytes = file_size(path)?;
    policy.describe(media_type, size_bytes)
}
