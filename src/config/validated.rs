//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use http::HeaderValue;
use tracing::Level;
use url::Url;

use crate::api::RetryPolicy;
use crate::listener::ListenerConfig;

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Stats reporting settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsConfig {
    /// Guild count to report
    pub guild_count: u64,

    /// Pause between reports
    pub interval: Duration,
}

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Diffcord API token (required)
    pub token: String,

    /// API base URL
    pub base_url: Url,

    /// Webhook listener settings; `None` disables the listener
    pub listener: Option<ListenerConfig>,

    /// Stats reporting settings; `None` disables reporting
    pub stats: Option<StatsConfig>,

    /// Retry policy for stats reports
    pub retry_policy: RetryPolicy,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listener = self.listener.as_ref().map_or_else(
            || "off".to_string(),
            |l| {
                format!(
                    "{}{}",
                    l.socket_addr(),
                    if l.verify_code.is_some() { " (verified)" } else { "" }
                )
            },
        );
        let stats = self.stats.map_or_else(
            || "off".to_string(),
            |s| format!("{} guilds every {}s", s.guild_count, s.interval.as_secs()),
        );

        write!(
            f,
            "Config {{ base_url: {}, token: <redacted>, listener: {}, stats: {}, retry: {}x/{}s }}",
            self.base_url,
            listener,
            stats,
            self.retry_policy.max_attempts,
            self.retry_policy.initial_delay.as_secs(),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The token is missing, blank, or not header-safe
    /// - The base URL is invalid
    /// - The listener host, port, or log level is invalid
    /// - Duration values are zero
    /// - Retry settings are inconsistent
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let token = Self::resolve_token(cli, toml)?;
        let base_url = Self::resolve_base_url(cli, toml)?;
        let listener = Self::resolve_listener(cli, toml)?;
        let stats = Self::resolve_stats(cli, toml)?;
        let retry_policy = Self::build_retry_policy(cli, toml)?;

        Ok(Self {
            token,
            base_url,
            listener,
            stats,
            retry_policy,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_token(cli: &Cli, toml: Option<&TomlConfig>) -> Result<String, ConfigError> {
        let token = cli
            .token
            .as_deref()
            .or_else(|| toml.and_then(|t| t.api.token.as_deref()))
            .ok_or_else(|| {
                ConfigError::missing(field::TOKEN, "Use --token or set api.token in config file")
            })?
            .trim();

        if token.is_empty() {
            return Err(ConfigError::InvalidToken {
                reason: "must not be empty",
            });
        }

        if HeaderValue::from_str(token).is_err() {
            return Err(ConfigError::InvalidToken {
                reason: "contains characters not allowed in an HTTP header",
            });
        }

        Ok(token.to_string())
    }

    fn resolve_base_url(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Url, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let url_str = cli
            .base_url
            .as_deref()
            .or_else(|| toml.and_then(|t| t.api.base_url.as_deref()))
            .unwrap_or(defaults::BASE_URL);

        let url = Url::parse(url_str).map_err(|e| ConfigError::InvalidUrl {
            url: url_str.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: url_str.to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }

        Ok(url)
    }

    fn resolve_listener(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Option<ListenerConfig>, ConfigError> {
        let section = toml.map(|t| &t.listener);

        let Some(port) = cli.port.or_else(|| section.and_then(|s| s.port)) else {
            return Ok(None);
        };
        if port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        let host = match cli
            .host
            .as_deref()
            .or_else(|| section.and_then(|s| s.host.as_deref()))
        {
            Some(value) => parse_host(value)?,
            None => defaults::HOST,
        };

        let log_level = match section.and_then(|s| s.log_level.as_deref()) {
            Some(value) => parse_log_level(value)?,
            None => defaults::LOG_LEVEL,
        };

        let verify_code = cli
            .verify_code
            .clone()
            .or_else(|| section.and_then(|s| s.verify_code.clone()));

        let silent = cli.silent || section.is_some_and(|s| s.silent);

        let mut config = ListenerConfig::new(port)
            .with_host(host)
            .with_silent(silent)
            .with_log_level(log_level);
        if let Some(code) = verify_code {
            config = config.with_verify_code(code);
        }

        Ok(Some(config))
    }

    fn resolve_stats(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Option<StatsConfig>, ConfigError> {
        let section = toml.map(|t| &t.stats);

        let Some(guild_count) = cli
            .guild_count
            .or_else(|| section.and_then(|s| s.guild_count))
        else {
            return Ok(None);
        };

        // Priority: CLI explicit > TOML > default
        let seconds = cli
            .stats_interval
            .or_else(|| section.and_then(|s| s.interval))
            .unwrap_or(defaults::STATS_INTERVAL_SECS);

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "stats_interval",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Some(StatsConfig {
            guild_count,
            interval: Duration::from_secs(seconds),
        }))
    }

    fn build_retry_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<RetryPolicy, ConfigError> {
        let retry = toml.map(|t| &t.retry);

        // Priority: CLI explicit > TOML > default
        let max_attempts = cli
            .retry_max
            .or_else(|| retry.and_then(|r| r.max_attempts))
            .unwrap_or(defaults::RETRY_MAX_ATTEMPTS);

        let initial_delay_secs = cli
            .retry_delay
            .or_else(|| retry.and_then(|r| r.initial_delay))
            .unwrap_or(defaults::RETRY_INITIAL_DELAY_SECS);

        let max_delay_secs = retry
            .and_then(|r| r.max_delay)
            .unwrap_or(defaults::RETRY_MAX_DELAY_SECS);

        let multiplier = retry
            .and_then(|r| r.multiplier)
            .unwrap_or(defaults::RETRY_MULTIPLIER);

        if max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if initial_delay_secs == 0 {
            return Err(ConfigError::InvalidRetry(
                "initial_delay must be greater than 0".to_string(),
            ));
        }

        if multiplier <= 0.0 || !multiplier.is_finite() {
            return Err(ConfigError::InvalidRetry(
                "multiplier must be a positive finite number".to_string(),
            ));
        }

        if max_delay_secs < initial_delay_secs {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay ({max_delay_secs}s) must be >= initial_delay ({initial_delay_secs}s)"
            )));
        }

        Ok(RetryPolicy::new()
            .with_max_attempts(max_attempts)
            .with_initial_delay(Duration::from_secs(initial_delay_secs))
            .with_max_delay(Duration::from_secs(max_delay_secs))
            .with_multiplier(multiplier))
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_host(value: &str) -> Result<IpAddr, ConfigError> {
    value
        .trim()
        .parse::<IpAddr>()
        .map_err(|_| ConfigError::InvalidHost {
            value: value.to_string(),
        })
}

fn parse_log_level(value: &str) -> Result<Level, ConfigError> {
    value
        .trim()
        .parse::<Level>()
        .map_err(|_| ConfigError::InvalidLogLevel {
            value: value.to_string(),
        })
}
