//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Diffcord: vote webhooks and bot stats for the Diffcord API
///
/// Without a subcommand, receives vote webhooks and/or pushes the guild
/// count until interrupted.
#[derive(Debug, Parser)]
#[command(name = "diffcord")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Diffcord API token (required except for init)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Diffcord API base URL
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Webhook listener port (enables the listener)
    #[arg(long)]
    pub port: Option<u16>,

    /// Webhook listener bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Shared secret expected in the webhook Authorization header
    #[arg(long = "verify-code")]
    pub verify_code: Option<String>,

    /// Suppress listener logging
    #[arg(long)]
    pub silent: bool,

    /// Guild count to report (enables stats reporting)
    #[arg(long = "guild-count")]
    pub guild_count: Option<u64>,

    /// Seconds between stats reports
    #[arg(long = "stats-interval")]
    pub stats_interval: Option<u64>,

    /// Maximum number of attempts per stats report
    #[arg(long = "retry-max")]
    pub retry_max: Option<u32>,

    /// Initial retry delay in seconds
    #[arg(long = "retry-delay")]
    pub retry_delay: Option<u64>,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for diffcord
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "diffcord.toml")]
        output: PathBuf,
    },

    /// Show a user's voting status
    UserVotes {
        /// Discord user ID
        user_id: String,
    },

    /// Show the bot's vote count for this month
    MonthVotes,

    /// List votes whose rewards were not acknowledged
    Unrewarded,

    /// Acknowledge rewards for the given votes
    Ack {
        /// Vote IDs to mark as rewarded
        #[arg(required = true)]
        vote_ids: Vec<String>,
    },

    /// Acknowledge rewards for all pending votes
    AckAll,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }
}
