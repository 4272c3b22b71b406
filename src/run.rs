//! Application execution logic.
//!
//! This module runs the client until a shutdown signal arrives, or performs
//! a single API query and formats its result.

use async_trait::async_trait;
use thiserror::Error;
use tokio::signal;

use diffcord::api::{ApiError, ApiGateway, HttpClient, ReqwestClient};
use diffcord::client::{Client, FixedGuildCount, StartError};
use diffcord::config::{Command, ValidatedConfig};
use diffcord::listener::{ListenerError, VoteHandler};
use diffcord::vote::{Vote, VoteInfo};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Neither the listener nor stats reporting is configured.
    #[error("Nothing to run: set a listener port and/or a guild count")]
    NothingToRun,

    /// The client failed to start.
    #[error(transparent)]
    Start(#[from] StartError),

    /// An API call failed.
    #[error("API request failed: {0}")]
    Api(#[from] ApiError),

    /// The listener did not stop cleanly.
    #[error("Failed to stop the webhook listener: {0}")]
    Shutdown(#[source] ListenerError),
}

/// Logs every received vote.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingVoteHandler;

#[async_trait]
impl VoteHandler for LoggingVoteHandler {
    async fn handle_vote(&self, vote: Vote) -> anyhow::Result<()> {
        let kind = if vote.is_test() { "Test vote" } else { "Vote" };
        tracing::info!(
            "{kind} from user {} ({} this month)",
            vote.user_id(),
            vote.monthly_votes()
        );
        Ok(())
    }
}

/// Runs the listener and/or stats loop until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if:
/// - Neither feature is configured
/// - The listener cannot bind or the token is rejected
/// - The listener fails while stopping
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    if config.listener.is_none() && config.stats.is_none() {
        return Err(RunError::NothingToRun);
    }

    let client = build_client(&config)?;
    let handle = client.start().await?;

    if let Some(stats) = config.stats {
        tracing::info!(
            "Reporting {} guilds every {}s",
            stats.guild_count,
            stats.interval.as_secs()
        );
    }

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping...");

    handle.shutdown().await.map_err(RunError::Shutdown)
}

/// Runs a one-shot query subcommand and prints its result.
///
/// # Errors
///
/// Returns an error if the API call fails.
#[cfg(not(tarpaulin_include))]
pub async fn query(config: ValidatedConfig, command: Command) -> Result<(), RunError> {
    let client = build_client(&config)?;

    if let Some(output) = run_query(&client, &command).await? {
        println!("{output}");
    }

    Ok(())
}

/// Builds the client described by `config`.
fn build_client(config: &ValidatedConfig) -> Result<Client, ApiError> {
    let gateway =
        ApiGateway::with_client(ReqwestClient::new(), config.base_url.clone(), &config.token)?;
    let mut client = Client::from_gateway(gateway).with_retry_policy(config.retry_policy.clone());

    if let Some(listener) = &config.listener {
        client = client.with_vote_handler(listener.clone(), LoggingVoteHandler);
    }

    if let Some(stats) = config.stats {
        client = client
            .with_stats(FixedGuildCount(stats.guild_count))
            .with_stats_interval(stats.interval);
    }

    Ok(client)
}

/// Performs the API call behind `command` and formats the result.
///
/// Returns `None` for commands that are not queries.
async fn run_query<H: HttpClient>(
    client: &Client<H>,
    command: &Command,
) -> Result<Option<String>, ApiError> {
    let output = match command {
        Command::UserVotes { user_id } => {
            format_vote_info(&client.get_user_vote_info(user_id).await?)
        }
        Command::MonthVotes => {
            format!("{} votes this month", client.bot_votes_this_month().await?)
        }
        Command::Unrewarded => format_votes(&client.unrewarded_votes().await?),
        Command::Ack { vote_ids } => {
            let ids: Vec<&str> = vote_ids.iter().map(String::as_str).collect();
            let rewarded = client.acknowledge_vote_rewards(&ids).await?;
            format!("Acknowledged rewards for {rewarded} user(s)")
        }
        Command::AckAll => {
            let rewarded = client.acknowledge_all_vote_rewards().await?;
            format!("Acknowledged rewards for {rewarded} user(s)")
        }
        // handled before configuration is loaded
        Command::Init { .. } => return Ok(None),
    };

    Ok(Some(output))
}

fn format_vote_info(info: &VoteInfo) -> String {
    let next = if info.can_vote() {
        "now".to_string()
    } else {
        info.next_vote()
            .map_or_else(|| "unknown".to_string(), |at| at.to_rfc3339())
    };
    let last = info
        .last_vote()
        .map_or_else(|| "never".to_string(), |at| at.to_rfc3339());

    format!(
        "User {}: {} vote(s) this month, last vote: {last}, can vote: {next}",
        info.user_id(),
        info.monthly_votes(),
    )
}

fn format_votes(votes: &[Vote]) -> String {
    if votes.is_empty() {
        return "No unrewarded votes".to_string();
    }

    votes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns a future that completes when a shutdown signal is received.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
