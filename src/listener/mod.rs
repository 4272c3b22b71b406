//! Inbound side of the SDK: the vote webhook server.
//!
//! This module provides:
//! - Listener settings ([`ListenerConfig`])
//! - The handler seam ([`VoteHandler`])
//! - The axum-based server and its lifecycle ([`VoteListener`], [`ListenerHandle`])
//! - Error types ([`ListenerError`], [`WebhookRejection`])
//!
//! Each accepted request moves through
//! `Received -> Authenticated -> Parsed -> Handled -> Responded` and stops at
//! the first failing step with a bare status code.

mod config;
mod error;
mod handler;
mod server;


pub use config::{DEFAULT_HOST, ListenerConfig};
pub use error::{ListenerError, WebhookRejection};
pub use handler::VoteHandler;
pub use server::{ListenerHandle, VoteListener};
