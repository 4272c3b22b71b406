//! Exponential backoff for transient API failures.

use std::future::Future;
use std::time::Duration;

use http::StatusCode;

use crate::time::Sleeper;

use super::{ApiError, HttpError};

/// Exponential backoff settings for retrying a failed API call.
///
/// Used by the stats reporter so that a single rate-limit or 5xx blip does
/// not cost a whole reporting interval.
///
/// # Defaults
///
/// - `max_attempts`: 3
/// - `initial_delay`: 5 seconds
/// - `max_delay`: 60 seconds
/// - `multiplier`: 2.0
///
/// # Example
///
/// ```
/// use diffcord::api::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .with_max_attempts(5)
///     .with_initial_delay(Duration::from_secs(1));
/// assert_eq!(policy.delay_for_retry(2), Duration::from_secs(4));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. 1 disables retries.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Upper bound for any single delay.
    pub max_delay: Duration,

    /// Factor applied to the delay after each retry.
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Default maximum attempts.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Default initial delay (5 seconds).
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(5);

    /// Default maximum delay (60 seconds).
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

    /// Default multiplier (2.0).
    pub const DEFAULT_MULTIPLIER: f64 = 2.0;

    /// Minimum value for `max_attempts`.
    pub const MIN_MAX_ATTEMPTS: u32 = 1;

    /// Creates a policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
            multiplier: Self::DEFAULT_MULTIPLIER,
        }
    }

    /// A policy that makes exactly one attempt.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new().with_max_attempts(1)
    }

    /// Sets the maximum number of attempts.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is less than 1.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        assert!(
            max_attempts >= Self::MIN_MAX_ATTEMPTS,
            "max_attempts must be at least 1"
        );
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the delay cap.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the delay multiplier.
    ///
    /// # Panics
    ///
    /// Panics if `multiplier` is not positive.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        assert!(multiplier > 0.0, "multiplier must be positive");
        self.multiplier = multiplier;
        self
    }

    /// Delay before retry number `retry` (0-indexed), capped at `max_delay`.
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        // retry counts stay far below i32::MAX
        #[allow(clippy::cast_possible_wrap)]
        let factor = self.multiplier.powi(retry as i32);
        let secs = (self.initial_delay.as_secs_f64() * factor).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Returns true if another attempt may follow attempt number `attempt` (1-indexed).
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Runs `operation` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Only errors for which [`IsRetryable::is_retryable`] is true are retried.
    /// The last error is returned once the policy is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error, or the last retryable one.
    pub async fn run<T, F, Fut, S>(&self, sleeper: &S, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
        S: Sleeper,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && self.should_retry(attempt) => {
                    let delay = self.delay_for_retry(attempt - 1);
                    tracing::debug!(
                        "Attempt {attempt}/{} failed ({e}), retrying in {:.1}s",
                        self.max_attempts,
                        delay.as_secs_f64()
                    );
                    sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifies errors as transient (worth retrying) or permanent.
pub trait IsRetryable {
    /// Returns true if the failure is likely transient.
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for HttpError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout => true,
            Self::InvalidUrl(_) => false,
        }
    }
}

impl IsRetryable for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Server { .. } => true,
            Self::Http { status, .. } => {
                status.is_server_error() || *status == StatusCode::REQUEST_TIMEOUT
            }
            Self::Transport(e) => e.is_retryable(),
            Self::InvalidToken { .. }
            | Self::Decode(_)
            | Self::EmptyResponse
            | Self::MalformedToken => false,
        }
    }
}
