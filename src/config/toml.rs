//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// API access section
    #[serde(default)]
    pub api: ApiSection,

    /// Webhook listener section
    #[serde(default)]
    pub listener: ListenerSection,

    /// Stats reporting section
    #[serde(default)]
    pub stats: StatsSection,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySection,
}

/// API access section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    /// Diffcord API token
    pub token: Option<String>,

    /// API base URL
    pub base_url: Option<String>,
}

/// Webhook listener section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenerSection {
    /// Listener port; the listener is enabled only when set
    pub port: Option<u16>,

    /// Bind address
    pub host: Option<String>,

    /// Shared secret expected in the Authorization header
    pub verify_code: Option<String>,

    /// Suppress listener logging
    #[serde(default)]
    pub silent: bool,

    /// Access log level
    pub log_level: Option<String>,
}

/// Stats reporting section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsSection {
    /// Guild count to report; reporting is enabled only when set
    pub guild_count: Option<u64>,

    /// Seconds between reports
    pub interval: Option<u64>,
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Maximum number of attempts
    pub max_attempts: Option<u32>,

    /// Initial retry delay in seconds
    pub initial_delay: Option<u64>,

    /// Maximum retry delay in seconds
    pub max_delay: Option<u64>,

    /// Backoff multiplier
    pub multiplier: Option<f64>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# Diffcord Configuration File

[api]
# API token from your bot's Diffcord dashboard (required)
# token = "your-token-here"

# API base URL (default: https://api.diffcord.com)
# base_url = "https://api.diffcord.com"

[listener]
# Port for the vote webhook listener; omit to disable the listener
# port = 8080

# Bind address (default: 0.0.0.0)
# host = "0.0.0.0"

# Shared secret Diffcord sends in the Authorization header
# verify_code = "your-verify-code"

# Suppress listener logging
# silent = false

# Access log level: trace, debug, info, warn, error (default: info)
# log_level = "info"

[stats]
# Guild count to report; omit to disable stats reporting
# guild_count = 100

# Seconds between reports (default: 3600)
# interval = 3600

[retry]
# Maximum number of attempts per stats report (default: 3)
# max_attempts = 3

# Initial retry delay in seconds (default: 5)
# initial_delay = 5

# Maximum retry delay in seconds (default: 60)
# max_delay = 60

# Backoff multiplier (default: 2.0)
# multiplier = 2.0
"#
    .to_string()
}
