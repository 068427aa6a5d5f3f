//! Submission
//!
//! Turns the local pending operation log into one server request at a time,
//! retrying transient failures and reconciling the outcome with the cart.

mod errors;
mod retry;
mod service;

pub use errors::SubmissionError;
pub use retry::RetryPolicy;
pub use service::{SharedCart, SubmissionService, lock, share};
