use thiserror::Error;

use crate::api::ApiError;
use crate::listener::ListenerError;

/// Why [`Client::start`](super::Client::start) failed.
#[derive(Debug, Error)]
pub enum StartError {
    /// The webhook listener could not be started.
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// The API rejected the token during startup validation.
    #[error("Diffcord rejected the API token; check the token in your bot dashboard ({0})")]
    InvalidToken(#[source] ApiError),

    /// The validating call failed for another reason.
    #[error("Failed to validate the API token: {0}")]
    Validation(#[source] ApiError),
}

impl StartError {
    /// Sorts a failed validating call into the matching variant.
    pub(crate) fn from_validation(error: ApiError) -> Self {
        if error.is_invalid_token() {
            Self::InvalidToken(error)
        } else {
            Self::Validation(error)
        }
    }
}
