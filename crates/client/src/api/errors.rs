//! Cart API errors.

use thiserror::Error;

/// Errors that can occur when talking to the cart API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status other than 401.
    #[error("cart request failed with status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,

        /// Response body, if any
        body: String,
    },

    /// The bearer token was missing, invalid or expired.
    #[error("cart API rejected the credentials")]
    Unauthorized,

    /// The configured base URL cannot have cart paths appended to it.
    #[error("invalid cart API base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether repeating the same request may succeed.
    ///
    /// Transport failures, timeouts, 5xx, 408 and 429 are transient. Other
    /// statuses, credential failures and undecodable responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(error) => !error.is_decode() && !error.is_builder(),
            Self::Status { status, .. } => *status >= 500 || matches!(status, 408 | 429),
            Self::Unauthorized | Self::InvalidUrl(_) => false,
        }
    }
}
