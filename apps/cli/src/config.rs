//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/mediadrop/config.toml`
//! - Windows: `%APPDATA%/mediadrop/config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use mediadrop_http::DEFAULT_BASE_URL;
use mediadrop_uploader::{MediaPolicy, PollConfig, PolicyRule, UploaderConfig};
use serde::{Deserialize, Serialize};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// API root; requests go to `{api_base_url}/media/upload.json`.
    #[serde(default = "default_base_url")]
    pub api_base_url: String,

    /// OAuth bearer token.
    #[serde(default)]
    pub bearer_token: String,

    /// Bytes per APPEND. Values above 5 MiB are clamped.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default)]
    pub poll: PollSettings,

    #[serde(default)]
    pub policy: PolicyOverrides,
}

/// `[poll]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSettings {
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,

    #[serde(default = "default_subsequent_delay")]
    pub subsequent_delay_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_polls: Option<u32>,
}

/// `[policy]` table. Rules here replace built-in rules for the same MIME
/// type and add new ones; everything else keeps the built-in policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyOverrides {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<PolicyRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_bytes: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_chunk_size() -> usize {
    UploaderConfig::default().chunk_size
}

fn default_initial_delay() -> u64 {
    PollConfig::default().initial_delay.as_secs()
}

fn default_subsequent_delay() -> u64 {
    PollConfig::default().subsequent_delay.as_secs()
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay(),
            subsequent_delay_secs: default_subsequent_delay(),
            max_polls: None,
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url(),
            bearer_token: String::new(),
            chunk_size: default_chunk_size(),
            poll: PollSettings::default(),
            policy: PolicyOverrides::default(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from the default location, creating it if missing.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads configuration from `path`, or writes and returns the defaults
    /// if the file does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: CliConfig = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        } else {
            let config = CliConfig::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix (may contain the bearer token).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Applies command-line overrides on top of the file values.
    pub fn apply_overrides(
        &mut self,
        token: Option<String>,
        base_url: Option<String>,
        max_polls: Option<u32>,
    ) {
        if let Some(token) = token {
            self.bearer_token = token;
        }
        if let Some(url) = base_url {
            self.api_base_url = url;
        }
        if max_polls.is_some() {
            self.poll.max_polls = max_polls;
        }
    }

    pub fn media_policy(&self) -> MediaPolicy {
        let mut policy = MediaPolicy::default();
        if let Some(max) = self.policy.default_max_bytes {
            policy.default_max_bytes = max;
        }
        self.policy
            .rules
            .iter()
            .cloned()
            .fold(policy, MediaPolicy::with_rule)
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            initial_delay: Duration::from_secs(self.poll.initial_delay_secs),
            subsequent_delay: Duration::from_secs(self.poll.subsequent_delay_secs),
            max_polls: self.poll.max_polls,
        }
    }

    pub fn uploader_config(&self) -> UploaderConfig {
        UploaderConfig {
            chunk_size: self.chunk_size,
            policy: self.media_policy(),
            poll: self.poll_config(),
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("mediadrop").join("config.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("mediadrop")
            .join("config.toml"))
    }
}
