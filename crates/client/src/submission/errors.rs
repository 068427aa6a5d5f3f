//! Submission errors.

use tablecart::cart::{CartError, OperationError};
use thiserror::Error;

use crate::api::ApiError;

/// Errors returned by [`super::SubmissionService`].
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// There is nothing to submit.
    #[error("no pending operations to submit")]
    NoOperations,

    /// Another submission has not finished yet.
    #[error("a submission is already in flight")]
    InFlight,

    /// The pending log contains an operation the server must not receive.
    #[error("pending operations are invalid")]
    Validation(#[from] OperationError),

    /// Retries were exhausted, or the failure cannot be retried. The
    /// operations stay queued for a manual retry.
    #[error("submission failed after {attempts} attempt(s)")]
    Network {
        /// Attempts made
        attempts: u32,

        /// Last failure
        #[source]
        source: ApiError,
    },

    /// The API token is missing or expired.
    #[error("authentication expired")]
    AuthExpired,

    /// The server refused the batch.
    #[error("server rejected the batch with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,

        /// Response body
        body: String,
    },

    /// The local cart could not be updated afterwards.
    #[error("failed to update local cart")]
    Cart(#[from] CartError),

    /// The background submission task did not complete.
    #[error("submission task failed")]
    Task(#[source] tokio::task::JoinError),
}

impl SubmissionError {
    /// Classify the failure that ended a request after `attempts` tries.
    pub(crate) fn from_api(attempts: u32, error: ApiError) -> Self {
        if error.is_transient() {
            return Self::Network {
                attempts,
                source: error,
            };
        }

        match error {
            ApiError::Unauthorized => Self::AuthExpired,
            ApiError::Status { status, body } => Self::Rejected { status, body },
            source @ (ApiError::Http(_) | ApiError::InvalidUrl(_)) => Self::Network { attempts, source },
        }
    }
}
