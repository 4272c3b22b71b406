//! Default values for configuration options.

use std::net::IpAddr;
use std::time::Duration;

use tracing::Level;

/// Default API base URL.
pub const BASE_URL: &str = crate::api::DEFAULT_BASE_URL;

/// Default listener bind host.
pub const HOST: IpAddr = crate::listener::DEFAULT_HOST;

/// Default listener access log level.
pub const LOG_LEVEL: Level = Level::INFO;

/// Default stats interval in seconds (one hour).
pub const STATS_INTERVAL_SECS: u64 = 3600;

/// Default maximum number of attempts per stats push.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Default initial retry delay in seconds.
pub const RETRY_INITIAL_DELAY_SECS: u64 = 5;

/// Default maximum retry delay in seconds.
pub const RETRY_MAX_DELAY_SECS: u64 = 60;

/// Default retry backoff multiplier.
pub const RETRY_MULTIPLIER: f64 = 2.0;

/// Default stats interval as Duration.
#[must_use]
pub const fn stats_interval() -> Duration {
    Duration::from_secs(STATS_INTERVAL_SECS)
}

/// Default initial retry delay as Duration.
#[must_use]
pub const fn retry_initial_delay() -> Duration {
    Duration::from_secs(RETRY_INITIAL_DELAY_SECS)
}

/// Default maximum retry delay as Duration.
#[must_use]
pub const fn retry_max_delay() -> Duration {
    Duration::from_secs(RETRY_MAX_DELAY_SECS)
}
