//! Wire shapes of vote payloads.
//!
//! Identifiers arrive as strings or integers and durations as numbers or
//! numeric strings depending on the API version, so both are normalized here.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer};

/// Raw vote as sent by the webhook or listed by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct VotePayload {
    /// Vote identifier
    #[serde(deserialize_with = "flexible_id")]
    pub vote_id: String,

    /// Voting user
    #[serde(deserialize_with = "flexible_id")]
    pub user_id: String,

    /// Bot voted for
    #[serde(deserialize_with = "flexible_id")]
    pub bot_id: String,

    /// Absolute vote time (RFC 3339)
    #[serde(default)]
    pub voted_at: Option<DateTime<FixedOffset>>,

    /// Seconds elapsed since the vote
    #[serde(default, deserialize_with = "flexible_seconds")]
    pub since_vote: Option<f64>,

    /// Whether the vote was already rewarded
    #[serde(default)]
    pub rewarded: bool,

    /// Whether this is a dashboard test vote
    #[serde(default)]
    pub test: bool,

    /// Votes by this user this month
    pub monthly_votes: u32,
}

/// Raw user vote status returned by `/v1/users/{id}/votes`.
#[derive(Debug, Clone, Deserialize)]
pub struct VoteInfoPayload {
    /// User identifier
    #[serde(deserialize_with = "flexible_id")]
    pub user_id: String,

    /// Bot identifier
    #[serde(deserialize_with = "flexible_id")]
    pub bot_id: String,

    /// Votes by this user this month
    #[serde(default)]
    pub monthly_votes: u32,

    /// Seconds since the last vote, absent if the user never voted
    #[serde(default, deserialize_with = "flexible_seconds")]
    pub since_last_vote: Option<f64>,

    /// Seconds until the next vote is allowed
    #[serde(default, deserialize_with = "flexible_seconds")]
    pub until_next_vote: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(u64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SecondsRepr {
    Number(f64),
    Text(String),
}

fn flexible_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Text(text) => text,
        IdRepr::Number(number) => number.to_string(),
    })
}

fn flexible_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<SecondsRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(SecondsRepr::Number(secs)) => Ok(Some(secs)),
        Some(SecondsRepr::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid seconds '{text}': {e}"))),
    }
}
