//! Listener error types.

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::vote::VoteError;

/// Failures of the listener lifecycle.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The socket could not be bound.
    #[error("Failed to bind webhook listener on {addr}: {source}")]
    Bind {
        /// Requested address
        addr: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("Webhook listener failed: {0}")]
    Serve(#[source] std::io::Error),

    /// The server task panicked or was aborted.
    #[error("Webhook listener task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Why a single webhook request was refused.
///
/// Converted into a bare status code response.
#[derive(Debug, Error)]
pub enum WebhookRejection {
    /// Missing or wrong `Authorization` header.
    #[error("Webhook authorization failed")]
    Unauthorized,

    /// Body is not a valid vote.
    #[error(transparent)]
    MalformedPayload(#[from] VoteError),

    /// The registered handler returned an error.
    #[error("Vote handler failed: {0:#}")]
    HandlerFailed(anyhow::Error),
}

impl WebhookRejection {
    /// Status code sent back to the caller.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Self::HandlerFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookRejection {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}
