//! Authenticated request gateway for the Diffcord API.

use http::header::{CONTENT_TYPE, HeaderName, HeaderValue, USER_AGENT};
use http::{HeaderMap, Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::{ApiError, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestClient};

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.diffcord.com";

/// Header carrying the API token.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// User agent sent with every request.
pub const SDK_USER_AGENT: &str = concat!("Diffcord-Rust-SDK/", env!("CARGO_PKG_VERSION"));

/// Error code the API uses for a rejected token.
pub const INVALID_API_KEY_CODE: &str = "ERR_INVALID_API_KEY";

/// Message used when an error response has no readable error body.
pub const PLACEHOLDER_MESSAGE: &str = "ERROR";

/// Code used when an error response has no readable error body.
pub const PLACEHOLDER_CODE: &str = "ERR_CODE";

/// Sends authenticated requests and maps responses onto [`ApiError`].
///
/// The transport `H` is created once and shared by every call, so a single
/// gateway can be used concurrently (wrap it in an `Arc`).
///
/// # Response mapping
///
/// Checked in order, first match wins:
///
/// | Status | Result |
/// |--------|--------|
/// | 401 with code `ERR_INVALID_API_KEY` | [`ApiError::InvalidToken`] |
/// | 500 | [`ApiError::Server`] |
/// | 429 | [`ApiError::RateLimited`] |
/// | other non-2xx (401 included) | [`ApiError::Http`] |
/// | 2xx, blank body | `Ok(None)` |
/// | 2xx | `Ok(data)` from `{"data": ...}` |
#[derive(Debug)]
pub struct ApiGateway<H = ReqwestClient> {
    client: H,
    base_url: Url,
    headers: HeaderMap,
}

impl ApiGateway<ReqwestClient> {
    /// Creates a gateway for the production API using reqwest.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MalformedToken`] if the token is not a valid header value.
    pub fn new(token: &str) -> Result<Self, ApiError> {
        Self::with_client(ReqwestClient::new(), default_base_url(), token)
    }
}

impl<H> ApiGateway<H> {
    /// Creates a gateway with a custom transport and base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MalformedToken`] if the token is not a valid header value.
    pub fn with_client(client: H, base_url: Url, token: &str) -> Result<Self, ApiError> {
        let mut api_key = HeaderValue::from_str(token).map_err(|_| ApiError::MalformedToken)?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(SDK_USER_AGENT));

        Ok(Self {
            client,
            base_url,
            headers,
        })
    }

    /// Returns the configured base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins `path` onto the base URL and appends `query`.
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let raw = format!("{}{path}", self.base_url.as_str().trim_end_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| HttpError::InvalidUrl(format!("{raw}: {e}")))?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }
}

impl<H: HttpClient> ApiGateway<H> {
    /// Sends a request and returns the `data` field of the response.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] according to the mapping table on [`ApiGateway`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError> {
        let url = self.endpoint(path, query)?;
        let mut request = HttpRequest::new(method, url).with_headers(self.headers.clone());

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(|e| ApiError::Decode(e.to_string()))?;
            request = request.with_body(bytes);
        }

        tracing::debug!("{} {}", request.method, request.url.path());
        let response = self.client.request(request).await?;
        interpret_response(&response)
    }

    /// Like [`request`](Self::request), but requires and decodes the `data` field.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::EmptyResponse`] if there is no `data`, or
    /// [`ApiError::Decode`] if it does not match `T`.
    pub async fn request_data<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let data = self
            .request(method, path, query, body)
            .await?
            .ok_or(ApiError::EmptyResponse)?;

        serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Default base URL as a parsed [`Url`].
#[must_use]
pub fn default_base_url() -> Url {
    #[allow(clippy::expect_used)]
    Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL")
}

#[derive(Deserialize)]
struct DataEnvelope {
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    code: String,
}

/// Maps a raw response onto the gateway's result.
fn interpret_response(response: &HttpResponse) -> Result<Option<Value>, ApiError> {
    let status = response.status;

    if !status.is_success() {
        let (message, code) = error_details(&response.body);
        return Err(match status {
            StatusCode::UNAUTHORIZED if code == INVALID_API_KEY_CODE => {
                ApiError::InvalidToken { message, code }
            }
            StatusCode::INTERNAL_SERVER_ERROR => ApiError::Server {
                status,
                message,
                code,
            },
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited { message, code },
            _ => ApiError::Http {
                status,
                message,
                code,
            },
        });
    }

    if response.is_body_blank() {
        return Ok(None);
    }

    // a bare `null` body carries no data
    let envelope: Option<DataEnvelope> =
        serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(envelope.and_then(|envelope| envelope.data))
}

/// Extracts `(message, code)` from an error body, or the placeholders.
fn error_details(body: &[u8]) -> (String, String) {
    serde_json::from_slice::<ErrorEnvelope>(body).map_or_else(
        |_| (PLACEHOLDER_MESSAGE.to_string(), PLACEHOLDER_CODE.to_string()),
        |envelope| (envelope.error.message, envelope.error.code),
    )
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
