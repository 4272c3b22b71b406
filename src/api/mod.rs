//! Outbound side of the SDK: authenticated calls to the Diffcord API.
//!
//! This module provides:
//! - Transport values and trait ([`HttpRequest`], [`HttpResponse`], [`HttpClient`])
//! - The production transport ([`ReqwestClient`])
//! - The authenticated gateway with status-code mapping ([`ApiGateway`])
//! - Error types ([`HttpError`], [`ApiError`])
//! - Backoff for transient failures ([`RetryPolicy`])

mod client;
mod error;
mod gateway;
mod retry;
mod transport;

#[cfg(test)]
mod client_tests;
#[cfg(test)]
pub(crate) mod test_fixtures;

pub use client::ReqwestClient;
pub use error::{ApiError, HttpError};
pub use gateway::{
    API_KEY_HEADER, ApiGateway, DEFAULT_BASE_URL, INVALID_API_KEY_CODE, PLACEHOLDER_CODE,
    PLACEHOLDER_MESSAGE, SDK_USER_AGENT, default_base_url,
};
pub use retry::{IsRetryable, RetryPolicy};
pub use transport::{HttpClient, HttpRequest, HttpResponse};
