//! Tests for `Vote` and `VoteInfo`.

use super::*;
use crate::time::FixedClock;
use chrono::{SecondsFormat, TimeZone};
use std::time::{Duration, SystemTime};

fn received_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn info(json: &str) -> VoteInfo {
    let payload: VoteInfoPayload = serde_json::from_str(json).unwrap();
    VoteInfo::from_payload(payload, received_at()).unwrap()
}

mod vote {
    use super::*;

    const WEBHOOK_BODY: &str = r#"{
        "vote_id": "3f1c2a4e-8d7b-4c1a-9e2f-0a1b2c3d4e5f",
        "user_id": "123456789012345678",
        "bot_id": "876543210987654321",
        "voted_at": "2023-03-05T20:29:46.315604-05:00",
        "rewarded": false,
        "test": true,
        "monthly_votes": 7
    }"#;

    #[test]
    fn parses_webhook_body_fields() {
        let clock = FixedClock(SystemTime::UNIX_EPOCH);
        let vote = Vote::from_json(WEBHOOK_BODY.as_bytes(), &clock).unwrap();

        assert_eq!(vote.vote_id(), "3f1c2a4e-8d7b-4c1a-9e2f-0a1b2c3d4e5f");
        assert_eq!(vote.user_id(), "123456789012345678");
        assert_eq!(vote.bot_id(), "876543210987654321");
        assert!(!vote.rewarded());
        assert!(vote.is_test());
        assert_eq!(vote.monthly_votes(), 7);
        assert_eq!(vote.since_vote(), None);
    }

    #[test]
    fn keeps_voted_at_offset_and_precision() {
        let clock = FixedClock(SystemTime::UNIX_EPOCH);
        let vote = Vote::from_json(WEBHOOK_BODY.as_bytes(), &clock).unwrap();

        assert_eq!(
            vote.voted_at().to_rfc3339_opts(SecondsFormat::Micros, false),
            "2023-03-05T20:29:46.315604-05:00"
        );
    }

    #[test]
    fn derives_voted_at_from_since_vote() {
        let body = r#"{"vote_id":"v1","user_id":1,"bot_id":2,"since_vote":"90.5","monthly_votes":1}"#;
        let payload: VotePayload = serde_json::from_str(body).unwrap();

        let vote = Vote::from_payload(payload, received_at()).unwrap();

        let expected = received_at() - TimeDelta::milliseconds(90_500);
        assert_eq!(vote.voted_at(), expected.fixed_offset());
        assert_eq!(vote.since_vote(), Some(TimeDelta::milliseconds(90_500)));
    }

    #[test]
    fn numeric_ids_become_strings() {
        let body = r#"{"vote_id":5,"user_id":123,"bot_id":456,"since_vote":0,"monthly_votes":1}"#;
        let clock = FixedClock(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000));

        let vote = Vote::from_json(body.as_bytes(), &clock).unwrap();

        assert_eq!(vote.vote_id(), "5");
        assert_eq!(vote.user_id(), "123");
        assert_eq!(vote.bot_id(), "456");
        assert_eq!(vote.voted_at().timestamp(), 1_000);
    }

    #[test]
    fn explicit_voted_at_wins_over_since_vote() {
        let body = r#"{"vote_id":"v","user_id":"u","bot_id":"b",
            "voted_at":"2024-01-01T00:00:00Z","since_vote":10,"monthly_votes":1}"#;
        let payload: VotePayload = serde_json::from_str(body).unwrap();

        let vote = Vote::from_payload(payload, received_at()).unwrap();

        assert_eq!(vote.voted_at().timestamp(), 1_704_067_200);
    }

    #[test]
    fn missing_timestamp_is_rejected() {
        let body = r#"{"vote_id":"v","user_id":"u","bot_id":"b","monthly_votes":1}"#;
        let payload: VotePayload = serde_json::from_str(body).unwrap();

        let result = Vote::from_payload(payload, received_at());

        assert!(matches!(result, Err(VoteError::MissingTimestamp)));
    }

    #[test]
    fn missing_monthly_votes_is_malformed() {
        let body = r#"{"vote_id":"v","user_id":"u","bot_id":"b","since_vote":1}"#;
        let clock = FixedClock(SystemTime::UNIX_EPOCH);

        let result = Vote::from_json(body.as_bytes(), &clock);

        assert!(matches!(result, Err(VoteError::Malformed(_))));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let clock = FixedClock(SystemTime::UNIX_EPOCH);

        let result = Vote::from_json(b"{not json", &clock);

        assert!(matches!(result, Err(VoteError::Malformed(_))));
    }

    #[test]
    fn non_numeric_since_vote_is_malformed() {
        let body = r#"{"vote_id":"v","user_id":"u","bot_id":"b","since_vote":"soon","monthly_votes":1}"#;
        let clock = FixedClock(SystemTime::UNIX_EPOCH);

        assert!(matches!(
            Vote::from_json(body.as_bytes(), &clock),
            Err(VoteError::Malformed(_))
        ));
    }

    #[test]
    fn display_mentions_ids() {
        let clock = FixedClock(SystemTime::UNIX_EPOCH);
        let vote = Vote::from_json(WEBHOOK_BODY.as_bytes(), &clock).unwrap();

        let shown = vote.to_string();

        assert!(shown.contains("123456789012345678"));
        assert!(shown.contains("monthly_votes: 7"));
    }
}

mod vote_info {
    use super::*;

    #[test]
    fn derives_last_and_next_vote() {
        let info = info(
            r#"{"user_id":"u","bot_id":"b","monthly_votes":3,"since_last_vote":3600,"until_next_vote":1800}"#,
        );

        assert_eq!(info.monthly_votes(), 3);
        assert_eq!(info.last_vote(), Some(received_at() - TimeDelta::hours(1)));
        assert_eq!(info.next_vote(), Some(received_at() + TimeDelta::minutes(30)));
        assert!(!info.can_vote());
    }

    #[test]
    fn never_voted_has_no_last_vote() {
        let info = info(
            r#"{"user_id":"u","bot_id":"b","monthly_votes":0,"since_last_vote":null,"until_next_vote":0}"#,
        );

        assert_eq!(info.since_last_vote(), None);
        assert_eq!(info.last_vote(), None);
    }

    #[test]
    fn can_vote_when_wait_is_zero() {
        let info = info(r#"{"user_id":"u","bot_id":"b","until_next_vote":0}"#);

        assert!(info.can_vote());
    }

    #[test]
    fn can_vote_when_wait_is_negative() {
        let info = info(r#"{"user_id":"u","bot_id":"b","until_next_vote":-5}"#);

        assert!(info.can_vote());
    }

    #[test]
    fn can_vote_when_wait_is_absent() {
        let info = info(r#"{"user_id":"u","bot_id":"b"}"#);

        assert!(info.can_vote());
        assert_eq!(info.next_vote(), None);
    }

    #[test]
    fn cannot_vote_with_positive_wait() {
        let info = info(r#"{"user_id":"u","bot_id":"b","until_next_vote":1}"#);

        assert!(!info.can_vote());
    }

    #[test]
    fn fetched_at_is_preserved() {
        let info = info(r#"{"user_id":"u","bot_id":"b"}"#);

        assert_eq!(info.fetched_at(), received_at());
        assert_eq!(info.user_id(), "u");
        assert_eq!(info.bot_id(), "b");
    }
}

mod durations {
    use super::*;

    #[test]
    fn fractional_seconds_round_to_millis() {
        assert_eq!(
            seconds_to_delta("f", 1.2345).unwrap(),
            TimeDelta::milliseconds(1_235)
        );
    }

    #[test]
    fn non_finite_seconds_are_rejected() {
        assert!(matches!(
            seconds_to_delta("f", f64::INFINITY),
            Err(VoteError::InvalidDuration { field: "f", .. })
        ));
        assert!(seconds_to_delta("f", f64::NAN).is_err());
    }

    #[test]
    fn huge_seconds_are_rejected() {
        assert!(seconds_to_delta("f", 1e300).is_err());
    }
}
