//! Diffcord: client SDK for the Diffcord voting API
//!
//! A library for querying vote statistics, receiving vote webhooks,
//! and periodically reporting a bot's guild count.
//!
//! - [`api`]: authenticated outbound calls and status-code mapping
//! - [`vote`]: vote records parsed from webhooks and API responses
//! - [`listener`]: the inbound webhook server
//! - [`client`]: the orchestrator tying the above together
//! - [`config`]: CLI/TOML configuration for the `diffcord` binary

pub mod api;
pub mod client;
pub mod config;
pub mod listener;
pub mod time;
mod unwind;
pub mod vote;

pub use api::ApiError;
pub use client::{Client, ClientHandle, StartError, StatsSource};
pub use listener::{ListenerConfig, VoteHandler};
pub use vote::{Vote, VoteInfo};
