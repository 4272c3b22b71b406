//! Production transport backed by reqwest.

use std::time::Duration;

use super::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Production HTTP transport using a pooled `reqwest::Client`.
///
/// One instance is created per [`ApiGateway`](super::ApiGateway) and reused
/// for every call; its connection pool is released when the last clone is
/// dropped.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a client with the default timeout.
    ///
    /// If the TLS backend cannot be initialised with that setting, falls back
    /// to reqwest's defaults (no timeout) and logs a warning. Use
    /// [`with_timeout`](Self::with_timeout) to handle the error instead.
    #[must_use]
    pub fn new() -> Self {
        match Self::with_timeout(Self::DEFAULT_TIMEOUT) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Failed to build HTTP client, requests will not time out: {e}");
                Self::from_client(reqwest::Client::default())
            }
        }
    }

    /// Creates a client whose requests fail after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let inner = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { inner })
    }

    /// Wraps an existing reqwest client (custom TLS, proxies, timeouts).
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = self
            .inner
            .request(req.method, req.url.as_str())
            .headers(req.headers);

        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else if e.is_builder() {
                HttpError::InvalidUrl(e.to_string())
            } else {
                HttpError::Connection(Box::new(e))
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    HttpError::Timeout
                } else {
                    HttpError::Connection(Box::new(e))
                }
            })?
            .to_vec();

        Ok(HttpResponse::new(status, headers, body))
    }
}
