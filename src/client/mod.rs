//! Client orchestrator: API operations, listener startup and stats reporting.
//!
//! [`Client::start`] brings the configured pieces up in order:
//! 1. the webhook listener (if any),
//! 2. one validating API call proving the token works,
//! 3. the background stats loop (if a [`StatsSource`] is set).
//!
//! The returned [`ClientHandle`] stops all of them.

mod error;
mod handle;
mod orchestrator;
mod stats;

#[cfg(test)]
mod orchestrator_tests;

pub use error::StartError;
pub use handle::ClientHandle;
pub use orchestrator::{Client, DEFAULT_STATS_INTERVAL};
pub use stats::{FixedGuildCount, StatsSource};
