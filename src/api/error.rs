//! Error types for outbound API calls.

use http::StatusCode;
use thiserror::Error;

/// Transport failure: the request never produced an HTTP response.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed (DNS, refused, reset).
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server did not answer within the timeout.
    #[error("Request timed out")]
    Timeout,

    /// The URL could not be used to build a request.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Error returned by every Diffcord API operation.
///
/// Status-code failures carry the `message`/`code` pair from the API's
/// `{"error": {...}}` body, or the `"ERROR"`/`"ERR_CODE"` placeholders when
/// that body was missing or malformed.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API key was rejected (401 with `ERR_INVALID_API_KEY`).
    #[error("Invalid API token [{code}]: {message}")]
    InvalidToken {
        /// Message from the API
        message: String,
        /// Error code from the API
        code: String,
    },

    /// Too many requests (429).
    #[error("Rate limited [{code}]: {message}")]
    RateLimited {
        /// Message from the API
        message: String,
        /// Error code from the API
        code: String,
    },

    /// The API failed internally (500).
    #[error("Server error {status} [{code}]: {message}")]
    Server {
        /// Response status
        status: StatusCode,
        /// Message from the API
        message: String,
        /// Error code from the API
        code: String,
    },

    /// Any other non-2xx response.
    #[error("HTTP error {status} [{code}]: {message}")]
    Http {
        /// Response status
        status: StatusCode,
        /// Message from the API
        message: String,
        /// Error code from the API
        code: String,
    },

    /// The request could not be delivered.
    #[error(transparent)]
    Transport(#[from] HttpError),

    /// A 2xx body could not be decoded into the expected shape.
    #[error("Failed to decode API response: {0}")]
    Decode(String),

    /// A 2xx response carried no `data` where one was required.
    #[error("API response contained no data")]
    EmptyResponse,

    /// The token cannot be sent as an HTTP header value.
    #[error("API token contains characters not allowed in a header")]
    MalformedToken,
}

impl ApiError {
    /// Returns the HTTP status for status-code failures.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::InvalidToken { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            Self::Server { status, .. } | Self::Http { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) | Self::EmptyResponse | Self::MalformedToken => {
                None
            }
        }
    }

    /// Returns true if this is [`ApiError::InvalidToken`].
    #[must_use]
    pub const fn is_invalid_token(&self) -> bool {
        matches!(self, Self::InvalidToken { .. })
    }
}
