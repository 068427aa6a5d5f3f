//! Tablecart client.
//!
//! Connects a local [`tablecart`] cart to the restaurant cart API: batch
//! submission with retries, server sync, configuration and logging setup.

pub mod api;
pub mod config;
pub mod context;
pub mod observability;
pub mod submission;
