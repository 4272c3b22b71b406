//! Vote records received from webhooks and the API.
//!
//! Both records are built from a raw, serde-decoded payload plus the time the
//! payload was received, because the API describes some instants relative to
//! "now" (seconds since the vote, seconds until the next vote).

mod payload;

#[cfg(test)]
mod vote_tests;

use std::fmt;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use thiserror::Error;

use crate::time::Clock;

pub use payload::{VoteInfoPayload, VotePayload};

/// Errors produced while turning a payload into a record.
#[derive(Debug, Error)]
pub enum VoteError {
    /// The body is not valid JSON or lacks required fields.
    #[error("Malformed vote payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Neither `voted_at` nor `since_vote` was present.
    #[error("Vote payload has neither 'voted_at' nor 'since_vote'")]
    MissingTimestamp,

    /// A seconds field is not a finite, representable number.
    #[error("Invalid duration for '{field}': {value}")]
    InvalidDuration {
        /// Name of the payload field
        field: &'static str,
        /// The offending value
        value: f64,
    },
}

/// A single vote for a bot.
///
/// Immutable once built. `voted_at` is taken from the payload when present,
/// otherwise derived as `received_at - since_vote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    vote_id: String,
    user_id: String,
    bot_id: String,
    voted_at: DateTime<FixedOffset>,
    since_vote: Option<TimeDelta>,
    rewarded: bool,
    test: bool,
    monthly_votes: u32,
}

impl Vote {
    /// Builds a vote from a decoded payload.
    ///
    /// # Errors
    ///
    /// Returns [`VoteError::MissingTimestamp`] if the payload carries no
    /// timestamp, or [`VoteError::InvalidDuration`] for a bad `since_vote`.
    pub fn from_payload(
        payload: VotePayload,
        received_at: DateTime<Utc>,
    ) -> Result<Self, VoteError> {
        let raw_since = payload.since_vote;
        let since_vote = raw_since
            .map(|secs| seconds_to_delta("since_vote", secs))
            .transpose()?;

        let voted_at = match (payload.voted_at, since_vote) {
            (Some(at), _) => at,
            (None, Some(elapsed)) => received_at
                .checked_sub_signed(elapsed)
                .ok_or(VoteError::InvalidDuration {
                    field: "since_vote",
                    value: raw_since.unwrap_or_default(),
                })?
                .fixed_offset(),
            (None, None) => return Err(VoteError::MissingTimestamp),
        };

        Ok(Self {
            vote_id: payload.vote_id,
            user_id: payload.user_id,
            bot_id: payload.bot_id,
            voted_at,
            since_vote,
            rewarded: payload.rewarded,
            test: payload.test,
            monthly_votes: payload.monthly_votes,
        })
    }

    /// Decodes a JSON body and builds a vote relative to `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`VoteError::Malformed`] for invalid JSON, or any error of
    /// [`Vote::from_payload`].
    pub fn from_json(body: &[u8], clock: &dyn Clock) -> Result<Self, VoteError> {
        let payload: VotePayload = serde_json::from_slice(body)?;
        Self::from_payload(payload, clock.now_utc())
    }

    /// Opaque vote identifier.
    #[must_use]
    pub fn vote_id(&self) -> &str {
        &self.vote_id
    }

    /// Identifier of the voting user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Identifier of the bot voted for.
    #[must_use]
    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    /// When the vote was cast.
    #[must_use]
    pub const fn voted_at(&self) -> DateTime<FixedOffset> {
        self.voted_at
    }

    /// Elapsed time reported by the API, if the payload carried one.
    #[must_use]
    pub const fn since_vote(&self) -> Option<TimeDelta> {
        self.since_vote
    }

    /// Whether the vote has been rewarded or acknowledged.
    #[must_use]
    pub const fn rewarded(&self) -> bool {
        self.rewarded
    }

    /// Whether this is a test vote sent from the dashboard.
    #[must_use]
    pub const fn is_test(&self) -> bool {
        self.test
    }

    /// Votes this user has given the bot this month.
    #[must_use]
    pub const fn monthly_votes(&self) -> u32 {
        self.monthly_votes
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vote {{ id: {}, user: {}, bot: {}, voted_at: {}, rewarded: {}, test: {}, monthly_votes: {} }}",
            self.vote_id,
            self.user_id,
            self.bot_id,
            self.voted_at.to_rfc3339(),
            self.rewarded,
            self.test,
            self.monthly_votes,
        )
    }
}

/// A user's voting status for the authenticated bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteInfo {
    user_id: String,
    bot_id: String,
    monthly_votes: u32,
    since_last_vote: Option<TimeDelta>,
    until_next_vote: Option<TimeDelta>,
    fetched_at: DateTime<Utc>,
}

impl VoteInfo {
    /// Builds a record from a decoded payload fetched at `fetched_at`.
    ///
    /// # Errors
    ///
    /// Returns [`VoteError::InvalidDuration`] if a seconds field is not finite.
    pub fn from_payload(
        payload: VoteInfoPayload,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, VoteError> {
        let since_last_vote = payload
            .since_last_vote
            .map(|secs| seconds_to_delta("since_last_vote", secs))
            .transpose()?;
        let until_next_vote = payload
            .until_next_vote
            .map(|secs| seconds_to_delta("until_next_vote", secs))
            .transpose()?;

        Ok(Self {
            user_id: payload.user_id,
            bot_id: payload.bot_id,
            monthly_votes: payload.monthly_votes,
            since_last_vote,
            until_next_vote,
            fetched_at,
        })
    }

    /// Identifier of the user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Identifier of the bot.
    #[must_use]
    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    /// Votes this user has given the bot this month.
    #[must_use]
    pub const fn monthly_votes(&self) -> u32 {
        self.monthly_votes
    }

    /// Time since the user last voted; `None` if they never voted.
    #[must_use]
    pub const fn since_last_vote(&self) -> Option<TimeDelta> {
        self.since_last_vote
    }

    /// Time until the user may vote again.
    #[must_use]
    pub const fn until_next_vote(&self) -> Option<TimeDelta> {
        self.until_next_vote
    }

    /// When this record was fetched; anchor for the derived timestamps.
    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// When the user last voted.
    #[must_use]
    pub fn last_vote(&self) -> Option<DateTime<Utc>> {
        self.since_last_vote
            .and_then(|since| self.fetched_at.checked_sub_signed(since))
    }

    /// When the user may vote next.
    #[must_use]
    pub fn next_vote(&self) -> Option<DateTime<Utc>> {
        self.until_next_vote
            .and_then(|until| self.fetched_at.checked_add_signed(until))
    }

    /// True when the wait is zero, negative, or unknown.
    #[must_use]
    pub fn can_vote(&self) -> bool {
        self.until_next_vote
            .is_none_or(|until| until <= TimeDelta::zero())
    }
}

/// Converts fractional seconds into a millisecond-precision [`TimeDelta`].
fn seconds_to_delta(field: &'static str, secs: f64) -> Result<TimeDelta, VoteError> {
    let invalid = || VoteError::InvalidDuration { field, value: secs };

    let millis = (secs * 1000.0).round();
    #[allow(clippy::cast_precision_loss)]
    let limit = i64::MAX as f64;
    if !millis.is_finite() || millis.abs() >= limit {
        return Err(invalid());
    }

    #[allow(clippy::cast_possible_truncation)]
    let millis = millis as i64;
    TimeDelta::try_milliseconds(millis).ok_or_else(invalid)
}
