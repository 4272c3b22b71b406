//! Tests for `ReqwestClient`.

use super::*;

mod reqwest_client {
    use super::*;

    #[test]
    fn from_client_accepts_custom_client() {
        let custom = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap();
        let client = ReqwestClient::from_client(custom);

        assert!(format!("{client:?}").contains("ReqwestClient"));
    }

    #[tokio::test]
    async fn slow_server_hits_the_timeout() {
        use axum::Router;
        use axum::routing::get;

        let app = Router::new().route(
            "/v1/votes",
            get(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                "late"
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move { axum::serve(listener, app).await });

        let client = ReqwestClient::with_timeout(std::time::Duration::from_millis(100)).unwrap();
        let url = url::Url::parse(&format!("http://{addr}/v1/votes")).unwrap();

        let result = client.request(HttpRequest::get(url)).await;

        assert!(matches!(result, Err(HttpError::Timeout)));
        server.abort();
    }

    #[test]
    fn client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReqwestClient>();
    }

    #[tokio::test]
    async fn request_to_unreachable_port_returns_connection_error() {
        // Bind then drop to obtain a port with nothing listening on it.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ReqwestClient::new();
        let url = url::Url::parse(&format!("http://{addr}/v1/votes")).unwrap();

        let result = client.request(HttpRequest::get(url)).await;

        assert!(matches!(result, Err(HttpError::Connection(_))));
    }

    #[tokio::test]
    async fn request_round_trips_against_local_server() {
        use axum::Router;
        use axum::routing::get;

        let app = Router::new().route(
            "/v1/votes",
            get(|| async { r#"{"data":{"month_votes":3}}"# }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move { axum::serve(listener, app).await });

        let client = ReqwestClient::new();
        let url = url::Url::parse(&format!("http://{addr}/v1/votes")).unwrap();
        let response = client.request(HttpRequest::get(url)).await.unwrap();

        assert!(response.is_success());
        assert_eq!(response.body, br#"{"data":{"month_votes":3}}"#);

        server.abort();
    }
}
