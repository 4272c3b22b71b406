//! Periodic guild-count reporting.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, ApiGateway, HttpClient, RetryPolicy};
use crate::time::{Sleeper, TokioSleeper};
use crate::unwind::panic_message;

use super::orchestrator::push_stats;

/// Supplies the guild count and observes each push.
///
/// Failures are reported to [`on_stats_failure`](Self::on_stats_failure)
/// and never stop the loop. A panicking callback is logged and the loop
/// continues with the next interval.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Current number of guilds the bot is in.
    async fn guild_count(&self) -> u64;

    /// Called after a successful push.
    async fn on_stats_success(&self, _guild_count: u64) {}

    /// Called after a push failed and retries were exhausted.
    async fn on_stats_failure(&self, _error: &ApiError) {}
}

/// A [`StatsSource`] reporting a constant count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedGuildCount(pub u64);

#[async_trait]
impl StatsSource for FixedGuildCount {
    async fn guild_count(&self) -> u64 {
        self.0
    }

    async fn on_stats_failure(&self, error: &ApiError) {
        tracing::error!("Failed to update bot stats: {error}");
    }
}

/// Background loop pushing the guild count every `interval`.
pub(crate) struct StatsReporter<H, S = TokioSleeper> {
    api: Arc<ApiGateway<H>>,
    source: Arc<dyn StatsSource>,
    interval: Duration,
    retry: RetryPolicy,
    sleeper: S,
}

impl<H: HttpClient> StatsReporter<H> {
    pub(crate) fn new(
        api: Arc<ApiGateway<H>>,
        source: Arc<dyn StatsSource>,
        interval: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            api,
            source,
            interval,
            retry,
            sleeper: TokioSleeper,
        }
    }
}

impl<H: HttpClient, S: Sleeper> StatsReporter<H, S> {
    /// Replaces the sleeper used for the interval and retry backoff.
    #[cfg(test)]
    pub(crate) fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> StatsReporter<H, S2> {
        StatsReporter {
            api: self.api,
            source: self.source,
            interval: self.interval,
            retry: self.retry,
            sleeper,
        }
    }

    /// Pushes, sleeps, repeats until `token` is cancelled.
    ///
    /// Cancellation interrupts both an in-flight push and the sleep.
    pub(crate) async fn run(self, token: CancellationToken) {
        tracing::info!(
            "Stats reporting started, interval {}s",
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                () = self.report_guarded() => {}
            }

            tokio::select! {
                biased;
                () = token.cancelled() => break,
                () = self.sleeper.sleep(self.interval) => {}
            }
        }

        tracing::debug!("Stats reporting stopped");
    }

    /// Like [`report_once`](Self::report_once), but survives a panicking source.
    async fn report_guarded(&self) {
        if let Err(panic) = AssertUnwindSafe(self.report_once()).catch_unwind().await {
            tracing::error!("Stats source panicked: {}", panic_message(panic.as_ref()));
        }
    }

    /// Runs one push with retries and routes the outcome to the callbacks.
    pub(crate) async fn report_once(&self) {
        let guild_count = self.source.guild_count().await;

        let result = self
            .retry
            .run(&self.sleeper, || push_stats(&self.api, guild_count))
            .await;

        match result {
            Ok(()) => {
                tracing::debug!("Updated bot stats: {guild_count} guilds");
                self.source.on_stats_success(guild_count).await;
            }
            Err(e) => {
                tracing::warn!("Stats update failed: {e}");
                self.source.on_stats_failure(&e).await;
            }
        }
    }
}
