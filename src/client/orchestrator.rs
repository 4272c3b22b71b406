//! The [`Client`] type and its API operations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::Method;
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, ApiGateway, HttpClient, ReqwestClient, RetryPolicy};
use crate::listener::{ListenerConfig, VoteHandler, VoteListener};
use crate::time::{Clock, SystemClock};
use crate::vote::{Vote, VoteInfo, VoteInfoPayload, VotePayload};

use super::stats::StatsReporter;
use super::{ClientHandle, StartError, StatsSource};

/// Default pause between two stats pushes (one hour).
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(3600);

/// Entry point of the SDK.
///
/// Exposes every API operation directly and, through [`start`](Self::start),
/// runs the webhook listener and the stats loop.
///
/// # Example
///
/// ```no_run
/// use diffcord::client::{Client, FixedGuildCount};
/// use diffcord::listener::ListenerConfig;
/// use diffcord::vote::Vote;
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("my-token")?
///     .with_vote_handler(ListenerConfig::new(8080), |vote: Vote| async move {
///         println!("{vote}");
///         Ok::<_, anyhow::Error>(())
///     })
///     .with_stats(FixedGuildCount(42));
///
/// let handle = client.start().await?;
/// tokio::signal::ctrl_c().await?;
/// handle.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct Client<H = ReqwestClient> {
    api: Arc<ApiGateway<H>>,
    clock: Arc<dyn Clock>,
    listener: Option<VoteListener>,
    stats_source: Option<Arc<dyn StatsSource>>,
    stats_interval: Duration,
    retry_policy: RetryPolicy,
}

impl<H> Clone for Client<H> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            clock: Arc::clone(&self.clock),
            listener: self.listener.clone(),
            stats_source: self.stats_source.clone(),
            stats_interval: self.stats_interval,
            retry_policy: self.retry_policy.clone(),
        }
    }
}

impl<H> fmt::Debug for Client<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.api.base_url().as_str())
            .field("listener", &self.listener)
            .field("reports_stats", &self.stats_source.is_some())
            .field("stats_interval", &self.stats_interval)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

impl Client<ReqwestClient> {
    /// Creates a client for the production API.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MalformedToken`] if the token is not header-safe.
    pub fn new(token: &str) -> Result<Self, ApiError> {
        Ok(Self::from_gateway(ApiGateway::new(token)?))
    }
}

impl<H> Client<H> {
    /// Wraps an existing gateway.
    #[must_use]
    pub fn from_gateway(api: ApiGateway<H>) -> Self {
        Self {
            api: Arc::new(api),
            clock: Arc::new(SystemClock),
            listener: None,
            stats_source: None,
            stats_interval: DEFAULT_STATS_INTERVAL,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Runs `listener` when the client starts.
    #[must_use]
    pub fn with_listener(mut self, listener: VoteListener) -> Self {
        self.listener = Some(listener.with_clock(Arc::clone(&self.clock)));
        self
    }

    /// Shorthand for [`with_listener`](Self::with_listener).
    #[must_use]
    pub fn with_vote_handler(
        self,
        config: ListenerConfig,
        handler: impl VoteHandler + 'static,
    ) -> Self {
        self.with_listener(VoteListener::new(config, handler))
    }

    /// Enables the stats loop fed by `source`.
    #[must_use]
    pub fn with_stats(mut self, source: impl StatsSource + 'static) -> Self {
        self.stats_source = Some(Arc::new(source));
        self
    }

    /// Sets the pause between stats pushes.
    #[must_use]
    pub const fn with_stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    /// Sets the backoff applied to each stats push.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Replaces the clock anchoring relative vote timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.listener = self.listener.map(|l| l.with_clock(Arc::clone(&clock)));
        self.clock = clock;
        self
    }

    /// The underlying gateway.
    #[must_use]
    pub fn gateway(&self) -> &ApiGateway<H> {
        &self.api
    }

    /// Pause between stats pushes.
    #[must_use]
    pub const fn stats_interval(&self) -> Duration {
        self.stats_interval
    }
}

#[derive(Deserialize)]
struct MonthVotes {
    month_votes: u64,
}

#[derive(Deserialize)]
struct UsersRewarded {
    users_rewarded: u64,
}

impl<H: HttpClient> Client<H> {
    /// Fetches the voting status of one user.
    ///
    /// # Errors
    ///
    /// Returns any [`ApiError`] from the call, or [`ApiError::Decode`] if the
    /// record is malformed.
    pub async fn get_user_vote_info(&self, user_id: &str) -> Result<VoteInfo, ApiError> {
        let path = format!("/v1/users/{user_id}/votes");
        let payload: VoteInfoPayload = self.api.request_data(Method::GET, &path, &[], None).await?;

        VoteInfo::from_payload(payload, self.clock.now_utc())
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Number of votes the bot received this month.
    ///
    /// # Errors
    ///
    /// Returns any [`ApiError`] from the call.
    pub async fn bot_votes_this_month(&self) -> Result<u64, ApiError> {
        let data: MonthVotes = self.api.request_data(Method::GET, "/v1/votes", &[], None).await?;
        Ok(data.month_votes)
    }

    /// Reports the bot's guild count.
    ///
    /// # Errors
    ///
    /// Returns any [`ApiError`] from the call.
    pub async fn update_bot_stats(&self, guild_count: u64) -> Result<(), ApiError> {
        push_stats(&self.api, guild_count).await
    }

    /// Votes whose rewards have not been acknowledged yet.
    ///
    /// # Errors
    ///
    /// Returns any [`ApiError`] from the call, or [`ApiError::Decode`] if a
    /// vote is malformed.
    pub async fn unrewarded_votes(&self) -> Result<Vec<Vote>, ApiError> {
        let payloads: Vec<VotePayload> = self
            .api
            .request_data(Method::GET, "/v1/votes/unrewarded", &[], None)
            .await?;

        let now = self.clock.now_utc();
        payloads
            .into_iter()
            .map(|payload| Vote::from_payload(payload, now))
            .collect::<Result<_, _>>()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Marks the given votes as rewarded. Returns how many users were rewarded.
    ///
    /// # Errors
    ///
    /// Returns any [`ApiError`] from the call.
    pub async fn acknowledge_vote_rewards(&self, vote_ids: &[&str]) -> Result<u64, ApiError> {
        let body = json!({ "vote_ids": vote_ids });
        let data: UsersRewarded = self
            .api
            .request_data(Method::POST, "/v1/votes/unrewarded", &[], Some(&body))
            .await?;
        Ok(data.users_rewarded)
    }

    /// Marks every pending vote as rewarded. Returns how many users were rewarded.
    ///
    /// # Errors
    ///
    /// Returns any [`ApiError`] from the call.
    pub async fn acknowledge_all_vote_rewards(&self) -> Result<u64, ApiError> {
        let data: UsersRewarded = self
            .api
            .request_data(Method::POST, "/v1/votes/unrewarded/all", &[], None)
            .await?;
        Ok(data.users_rewarded)
    }
}

impl<H: HttpClient + Send + Sync + 'static> Client<H> {
    /// Starts the listener, validates the token and spawns the stats loop.
    ///
    /// If validation fails, the listener started in the first step is shut
    /// down before the error is returned.
    ///
    /// # Errors
    ///
    /// - [`StartError::Listener`] if the listener cannot bind
    /// - [`StartError::InvalidToken`] if the API rejects the token
    /// - [`StartError::Validation`] if the validating call fails otherwise
    pub async fn start(&self) -> Result<ClientHandle, StartError> {
        let token = CancellationToken::new();

        let listener = match &self.listener {
            Some(listener) => Some(listener.start_with_token(token.child_token()).await?),
            None => None,
        };

        let month_votes = match self.bot_votes_this_month().await {
            Ok(votes) => votes,
            Err(e) => {
                token.cancel();
                if let Some(handle) = listener {
                    if let Err(shutdown_error) = handle.shutdown().await {
                        tracing::warn!("Listener did not stop cleanly: {shutdown_error}");
                    }
                }
                return Err(StartError::from_validation(e));
            }
        };
        tracing::info!("Diffcord token validated ({month_votes} votes this month)");

        let stats = self.stats_source.as_ref().map(|source| {
            let reporter = StatsReporter::new(
                Arc::clone(&self.api),
                Arc::clone(source),
                self.stats_interval,
                self.retry_policy.clone(),
            );
            tokio::spawn(reporter.run(token.child_token()))
        });

        Ok(ClientHandle::new(listener, stats, token))
    }
}

/// `POST /v1/stats?guilds={n}`, shared by the client and the stats loop.
pub(super) async fn push_stats<H: HttpClient>(
    api: &ApiGateway<H>,
    guild_count: u64,
) -> Result<(), ApiError> {
    let guilds = guild_count.to_string();
    api.request(Method::POST, "/v1/stats", &[("guilds", guilds.as_str())], None)
        .await
        .map(|_| ())
}
