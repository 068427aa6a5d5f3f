//! Cart errors

use thiserror::Error;

use crate::{fingerprint::Fingerprint, storage::StorageError};

/// Errors returned by cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Items must be added with a quantity of at least one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// No line item carries the given fingerprint.
    #[error("no line item with fingerprint {0}")]
    LineNotFound(Fingerprint),

    /// The mutation was applied in memory but could not be persisted.
    #[error("failed to persist cart")]
    Storage(#[from] StorageError),
}

/// A pending operation that must not be sent to the server.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperationError {
    /// The operation at `index` is malformed.
    #[error("operation {index} is invalid: {reason}")]
    Invalid {
        /// Position of the operation in the log
        index: usize,

        /// What is wrong with it
        reason: String,
    },
}
