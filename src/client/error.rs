//! Game API error types.

use thiserror::Error;

/// Failure of a single game API call.
///
/// The `Display` text is what ends up in a ship's `lastError`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{action} failed with status {status}: {body}")]
    Status {
        action: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid agent token: {0}")]
    InvalidToken(String),

    #[error("{0}")]
    Rejected(String),
}

pub type ApiResult<T> = Result<T, ApiError>;
