//! Tests for `Client` operations and startup.

use super::stats_tests::RecordingSource;
use super::*;
use crate::api::test_fixtures::MockClient;
use crate::api::{ApiError, ApiGateway, HttpResponse, RetryPolicy};
use crate::listener::ListenerConfig;
use crate::time::FixedClock;
use crate::vote::Vote;
use chrono::TimeDelta;
use http::{Method, StatusCode};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use url::Url;

const MONTH_VOTES: &str = r#"{"data":{"month_votes":12}}"#;
const INVALID_KEY: &str = r#"{"error":{"message":"bad key","code":"ERR_INVALID_API_KEY"}}"#;

fn client_with(mock: MockClient) -> (Client<Arc<MockClient>>, Arc<MockClient>) {
    let mock = Arc::new(mock);
    let gateway = ApiGateway::with_client(
        Arc::clone(&mock),
        Url::parse("https://api.example.test").unwrap(),
        "token",
    )
    .unwrap();
    let clock = FixedClock(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000));
    (Client::from_gateway(gateway).with_clock(Arc::new(clock)), mock)
}

fn loopback(port: u16) -> ListenerConfig {
    ListenerConfig::new(port)
        .with_host(IpAddr::V4(Ipv4Addr::LOCALHOST))
        .with_silent(true)
}

fn ok(body: &str) -> Result<HttpResponse, crate::api::HttpError> {
    Ok(HttpResponse::with_status(StatusCode::OK, body))
}

mod operations {
    use super::*;

    #[tokio::test]
    async fn get_user_vote_info_fetches_user_path() {
        let (client, mock) = client_with(MockClient::replying(
            StatusCode::OK,
            r#"{"data":{"user_id":"42","bot_id":"7","monthly_votes":3,"since_last_vote":60,"until_next_vote":0}}"#,
        ));

        let info = client.get_user_vote_info("42").await.unwrap();

        let request = &mock.captured_requests()[0];
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url.path(), "/v1/users/42/votes");
        assert_eq!(info.monthly_votes(), 3);
        assert!(info.can_vote());
        assert_eq!(info.fetched_at().timestamp(), 1_700_000_000);
        assert_eq!(info.since_last_vote(), Some(TimeDelta::seconds(60)));
    }

    #[tokio::test]
    async fn bot_votes_this_month_reads_month_votes() {
        let (client, mock) = client_with(MockClient::replying(StatusCode::OK, MONTH_VOTES));

        assert_eq!(client.bot_votes_this_month().await.unwrap(), 12);
        assert_eq!(mock.captured_requests()[0].url.path(), "/v1/votes");
    }

    #[tokio::test]
    async fn missing_data_is_empty_response() {
        let (client, _) = client_with(MockClient::replying(StatusCode::OK, ""));

        let result = client.bot_votes_this_month().await;

        assert!(matches!(result, Err(ApiError::EmptyResponse)));
    }

    #[tokio::test]
    async fn missing_field_is_decode_error() {
        let (client, _) = client_with(MockClient::replying(StatusCode::OK, r#"{"data":{}}"#));

        let result = client.bot_votes_this_month().await;

        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn update_bot_stats_posts_guild_query() {
        let (client, mock) = client_with(MockClient::replying(StatusCode::OK, ""));

        client.update_bot_stats(42).await.unwrap();

        let request = &mock.captured_requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url.as_str(), "https://api.example.test/v1/stats?guilds=42");
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn update_bot_stats_surfaces_errors() {
        let (client, _) = client_with(MockClient::replying(StatusCode::TOO_MANY_REQUESTS, ""));

        let result = client.update_bot_stats(1).await;

        assert!(matches!(result, Err(ApiError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn unrewarded_votes_are_parsed() {
        let (client, _) = client_with(MockClient::replying(
            StatusCode::OK,
            r#"{"data":[
                {"vote_id":"a","user_id":1,"bot_id":2,"since_vote":10,"monthly_votes":1},
                {"vote_id":"b","user_id":3,"bot_id":2,"voted_at":"2024-01-01T00:00:00Z","monthly_votes":4}
            ]}"#,
        ));

        let votes = client.unrewarded_votes().await.unwrap();

        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].vote_id(), "a");
        assert_eq!(votes[0].voted_at().timestamp(), 1_700_000_000 - 10);
        assert_eq!(votes[1].user_id(), "3");
        assert_eq!(votes[1].monthly_votes(), 4);
    }

    #[tokio::test]
    async fn unrewarded_vote_without_timestamp_is_decode_error() {
        let (client, _) = client_with(MockClient::replying(
            StatusCode::OK,
            r#"{"data":[{"vote_id":"a","user_id":1,"bot_id":2,"monthly_votes":1}]}"#,
        ));

        assert!(matches!(
            client.unrewarded_votes().await,
            Err(ApiError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn acknowledge_vote_rewards_sends_ids() {
        let (client, mock) = client_with(MockClient::replying(
            StatusCode::OK,
            r#"{"data":{"users_rewarded":2}}"#,
        ));

        let rewarded = client.acknowledge_vote_rewards(&["a", "b"]).await.unwrap();

        let request = &mock.captured_requests()[0];
        let body: serde_json::Value =
            serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(rewarded, 2);
        assert_eq!(request.url.path(), "/v1/votes/unrewarded");
        assert_eq!(body, serde_json::json!({"vote_ids": ["a", "b"]}));
    }

    #[tokio::test]
    async fn acknowledge_all_vote_rewards_posts_all_path() {
        let (client, mock) = client_with(MockClient::replying(
            StatusCode::OK,
            r#"{"data":{"users_rewarded":9}}"#,
        ));

        assert_eq!(client.acknowledge_all_vote_rewards().await.unwrap(), 9);
        let request = &mock.captured_requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url.path(), "/v1/votes/unrewarded/all");
    }
}

mod start {
    use super::*;

    #[tokio::test]
    async fn invalid_token_is_reraised() {
        let (client, _) = client_with(MockClient::replying(StatusCode::UNAUTHORIZED, INVALID_KEY));

        let result = client.start().await;

        assert!(matches!(result, Err(StartError::InvalidToken(ref e)) if e.is_invalid_token()));
    }

    #[tokio::test]
    async fn other_validation_failures_are_wrapped() {
        let (client, _) = client_with(MockClient::replying(StatusCode::SERVICE_UNAVAILABLE, ""));

        let result = client.start().await;

        assert!(matches!(result, Err(StartError::Validation(_))));
    }

    #[tokio::test]
    async fn bare_client_starts_and_stops() {
        let (client, mock) = client_with(MockClient::replying(StatusCode::OK, MONTH_VOTES));

        let handle = client.start().await.unwrap();

        assert_eq!(handle.listener_addr(), None);
        assert!(!handle.is_reporting_stats());
        assert_eq!(mock.calls(), 1);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn listener_receives_votes_after_start() {
        let (client, _) = client_with(MockClient::replying(StatusCode::OK, MONTH_VOTES));
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let client = client.with_vote_handler(loopback(0), move |vote: Vote| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(vote.vote_id().to_string());
                Ok::<_, anyhow::Error>(())
            }
        });

        let handle = client.start().await.unwrap();
        let addr = handle.listener_addr().unwrap();
        let response = reqwest::Client::new()
            .post(format!("http://{addr}/"))
            .body(r#"{"vote_id":"v9","user_id":"u","bot_id":"b","since_vote":1,"monthly_votes":1}"#)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(*seen.lock().unwrap(), vec!["v9".to_string()]);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn failed_validation_releases_the_listener_port() {
        let port = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let (client, _) = client_with(MockClient::replying(StatusCode::UNAUTHORIZED, INVALID_KEY));
        let client = client.with_vote_handler(loopback(port), |_vote: Vote| async {
            Ok::<_, anyhow::Error>(())
        });

        assert!(client.start().await.is_err());

        assert!(std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_ok());
    }

    #[tokio::test]
    async fn listener_bind_failure_is_reported() {
        let taken = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = taken.local_addr().unwrap().port();
        let (client, mock) = client_with(MockClient::replying(StatusCode::OK, MONTH_VOTES));
        let client = client.with_vote_handler(loopback(port), |_vote: Vote| async {
            Ok::<_, anyhow::Error>(())
        });

        let result = client.start().await;

        assert!(matches!(result, Err(StartError::Listener(_))));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stats_are_pushed_every_interval() {
        let mock = MockClient::new(vec![ok(MONTH_VOTES)]).then_always(StatusCode::OK, "");
        let (client, mock) = client_with(mock);
        let source = Arc::new(RecordingSource::with_count(8));
        let client = client
            .with_stats(SharedSource(Arc::clone(&source)))
            .with_stats_interval(Duration::from_secs(60))
            .with_retry_policy(RetryPolicy::no_retry());

        let handle = client.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(150)).await;
        handle.shutdown().await.unwrap();

        // validation + pushes at 0s, 60s and 120s
        assert_eq!(mock.calls(), 4);
        assert_eq!(source.successes(), vec![8, 8, 8]);
    }

    #[tokio::test(start_paused = true)]
    async fn stats_failures_go_to_the_callback() {
        let mock = MockClient::new(vec![ok(MONTH_VOTES)])
            .then_always(StatusCode::BAD_REQUEST, r#"{"error":{"message":"no","code":"ERR_BAD"}}"#);
        let (client, _) = client_with(mock);
        let source = Arc::new(RecordingSource::with_count(1));
        let client = client.with_stats(SharedSource(Arc::clone(&source)));

        let handle = client.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.shutdown().await.unwrap();

        let failures = source.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("ERR_BAD"));
    }
}

#[test]
fn default_interval_is_one_hour() {
    let (client, _) = client_with(MockClient::new(vec![]));

    assert_eq!(client.stats_interval(), Duration::from_secs(3600));
    assert_eq!(DEFAULT_STATS_INTERVAL, Duration::from_secs(3600));
}

/// Lets a test keep a reference to the source handed to the client.
struct SharedSource(Arc<RecordingSource>);

#[async_trait::async_trait]
impl StatsSource for SharedSource {
    async fn guild_count(&self) -> u64 {
        self.0.guild_count().await
    }

    async fn on_stats_success(&self, guild_count: u64) {
        self.0.on_stats_success(guild_count).await;
    }

    async fn on_stats_failure(&self, error: &ApiError) {
        self.0.on_stats_failure(error).await;
    }
}
