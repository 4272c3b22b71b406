//! Configuration layer for the `diffcord` binary.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! The only required field is `token`.
//!
//! # Optional Features
//!
//! The webhook listener runs only when a `port` is configured, and the stats
//! loop runs only when a `guild_count` is configured. Other listener and stats
//! settings are ignored unless their feature is enabled.
//!
//! # Boolean Flag Semantics
//!
//! `--silent` uses OR semantics: if set `true` in either CLI or TOML, the
//! result is `true`. CLI cannot turn off a TOML `silent = true`.
//!
//! # TOML-Only Options
//!
//! - `listener.log_level` (default: `info`) - Access log level
//! - `retry.max_delay` (default: 60s) - Maximum retry delay
//! - `retry.multiplier` (default: 2.0) - Exponential backoff multiplier

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command};
pub use error::{ConfigError, field};
pub use toml::{TomlConfig, default_config_template};
pub use validated::{StatsConfig, ValidatedConfig, write_default_config};
